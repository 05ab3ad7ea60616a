//! Filtering, ordering and pagination over normalized leads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::instant::parse_instant;
use super::types::{Lead, LeadSource, LeadsPage};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    /// Unknown values fall back to the default (`desc`).
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => SortDir::Asc,
            _ => SortDir::Desc,
        }
    }
}

/// Which sources a query reads. Excluded sources are never fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    Only(LeadSource),
}

impl SourceFilter {
    /// Unknown values, including `all`, read every source.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse::<LeadSource>()
            .map_or(SourceFilter::All, SourceFilter::Only)
    }

    #[must_use]
    pub fn sources(self) -> Vec<LeadSource> {
        match self {
            SourceFilter::All => LeadSource::ALL.to_vec(),
            SourceFilter::Only(source) => vec![source],
        }
    }

    #[must_use]
    pub fn includes(self, source: LeadSource) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Only(only) => only == source,
        }
    }
}

/// Query options for the aggregated lead list.
///
/// Date bounds are inclusive. Date-only inputs resolve to UTC midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadQuery {
    pub source: SourceFilter,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub search_term: Option<String>,
    /// When `false`, contact leads that already have a response are hidden.
    pub show_responded: bool,
    pub sort_dir: SortDir,
    pub page: usize,
    pub page_size: usize,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self {
            source: SourceFilter::All,
            date_from: None,
            date_to: None,
            search_term: None,
            show_responded: true,
            sort_dir: SortDir::Desc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LeadQuery {
    /// Sets date bounds from raw strings. Malformed values mean "no bound".
    #[must_use]
    pub fn with_date_bounds(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.date_from = from.and_then(parse_instant);
        self.date_to = to.and_then(parse_instant);
        self
    }

    /// Sets page and page size from untrusted input, clamping into range.
    #[must_use]
    pub fn with_paging(mut self, page: Option<i64>, page_size: Option<i64>) -> Self {
        self.page = page.map_or(1, |p| clamp_to_usize(p, 1, usize::MAX));
        self.page_size =
            page_size.map_or(DEFAULT_PAGE_SIZE, |s| clamp_to_usize(s, 1, MAX_PAGE_SIZE));
        self
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.page.max(1).saturating_sub(1).saturating_mul(self.page_size)
    }

    fn search_needle(&self) -> Option<String> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    /// Applies every filter except pagination.
    #[must_use]
    pub fn matches(&self, lead: &Lead) -> bool {
        self.matches_with(lead, self.search_needle().as_deref())
    }

    fn matches_with(&self, lead: &Lead, needle: Option<&str>) -> bool {
        if !self.source.includes(lead.source) {
            return false;
        }
        if self.date_from.is_some_and(|from| lead.created_at < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| lead.created_at > to) {
            return false;
        }
        if !self.show_responded && lead.source.tracks_response() && lead.is_responded() {
            return false;
        }
        needle.is_none_or(|needle| matches_search(lead, needle))
    }
}

/// Case-insensitive substring match on name, email and company.
fn matches_search(lead: &Lead, needle: &str) -> bool {
    [Some(&lead.name), Some(&lead.email), lead.company.as_ref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

fn clamp_to_usize(value: i64, min: usize, max: usize) -> usize {
    usize::try_from(value).unwrap_or(min).clamp(min, max)
}

/// Filters, sorts by `created_at` and slices one page.
///
/// The sort is stable, so leads sharing a timestamp keep their input order.
#[must_use]
pub fn aggregate(leads: Vec<Lead>, query: &LeadQuery) -> LeadsPage {
    let needle = query.search_needle();
    let mut filtered: Vec<Lead> = leads
        .into_iter()
        .filter(|lead| query.matches_with(lead, needle.as_deref()))
        .collect();

    match query.sort_dir {
        SortDir::Asc => filtered.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortDir::Desc => filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    let total = filtered.len();
    let items = filtered
        .into_iter()
        .skip(query.offset())
        .take(query.page_size)
        .collect();

    LeadsPage {
        items,
        total,
        page: query.page,
        page_size: query.page_size,
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
