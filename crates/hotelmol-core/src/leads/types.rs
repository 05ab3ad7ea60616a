use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Provenance of a lead. Each variant owns exactly one physical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    Demo,
    Contact,
    Roi,
}

impl LeadSource {
    /// All sources in reader order.
    pub const ALL: [LeadSource; 3] = [LeadSource::Demo, LeadSource::Contact, LeadSource::Roi];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LeadSource::Demo => "demo",
            LeadSource::Contact => "contact",
            LeadSource::Roi => "roi",
        }
    }

    /// Backing table for reads and mutations of this source.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            LeadSource::Demo => "demo_requests",
            LeadSource::Contact => "contact_forms",
            LeadSource::Roi => "roi_calculations",
        }
    }

    /// Only contact submissions track a staff response.
    #[must_use]
    pub fn tracks_response(self) -> bool {
        matches!(self, LeadSource::Contact)
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown lead source '{0}', expected one of: demo, contact, roi")]
pub struct UnknownLeadSource(pub String);

impl FromStr for LeadSource {
    type Err = UnknownLeadSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(LeadSource::Demo),
            "contact" => Ok(LeadSource::Contact),
            "roi" => Ok(LeadSource::Roi),
            _ => Err(UnknownLeadSource(s.to_owned())),
        }
    }
}

/// A raw row as read from one source table, keyed by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLead {
    pub source: LeadSource,
    pub record: Map<String, Value>,
}

impl RawLead {
    #[must_use]
    pub fn new(source: LeadSource, record: Map<String, Value>) -> Self {
        Self { source, record }
    }
}

/// Unified lead shape shared by all three sources.
///
/// `(source, id)` is the identity; `id` alone is only unique per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub source: LeadSource,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub hotel_size: Option<i64>,
    pub message: Option<String>,
    pub detail: String,
    pub integration_type: Option<String>,
    pub position: Option<String>,
    pub form_type: Option<String>,
    pub calculated_roi: Option<f64>,
    pub current_revenue: Option<f64>,
    pub monthly_savings: Option<f64>,
    pub annual_revenue: Option<f64>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_new: bool,
    pub data_processing_consent: bool,
    pub marketing_consent: bool,
}

impl Lead {
    #[must_use]
    pub fn key(&self) -> (LeadSource, i64) {
        (self.source, self.id)
    }

    #[must_use]
    pub fn is_responded(&self) -> bool {
        self.responded_at.is_some()
    }
}

/// One page of the filtered, sorted lead list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadsPage {
    pub items: Vec<Lead>,
    /// Count of matching leads before pagination.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl LeadsPage {
    #[must_use]
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            page_size,
        }
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeadStats {
    pub total_leads: usize,
    pub new_leads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyLeadCount {
    /// UTC calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub count: usize,
}

/// Compact row for the dashboard's latest-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestLead {
    pub id: i64,
    pub source: LeadSource,
    pub name: String,
    pub detail: String,
    pub company: Option<String>,
    pub integration_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_new: bool,
}
