//! Concurrent source reads feeding the aggregated lead list.

use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use hotelmol_core::{
    aggregate, normalize, AppConfig, Lead, LeadQuery, LeadSource, LeadsPage, RawLead,
};

use super::store::LeadStore;

const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// A source read slower than this is treated as failed.
    pub source_timeout: Duration,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_millis(DEFAULT_SOURCE_TIMEOUT_MS),
        }
    }
}

impl ReadOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            source_timeout: Duration::from_millis(config.source_timeout_ms),
        }
    }
}

/// Reads `sources` concurrently, in order.
///
/// A failed or timed-out source is logged and contributes no rows; the other
/// sources are unaffected.
async fn read_sources<S>(store: &S, sources: &[LeadSource], options: ReadOptions) -> Vec<RawLead>
where
    S: LeadStore + ?Sized,
{
    let reads = sources.iter().map(|&source| async move {
        match tokio::time::timeout(options.source_timeout, store.list(source)).await {
            Ok(Ok(rows)) => {
                tracing::debug!(source = %source, count = rows.len(), "read lead source");
                rows
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    source = %source,
                    table = source.table(),
                    error = %e,
                    "lead source read failed; treating as empty"
                );
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    source = %source,
                    table = source.table(),
                    timeout = ?options.source_timeout,
                    "lead source read timed out; treating as empty"
                );
                Vec::new()
            }
        }
    });

    join_all(reads).await.into_iter().flatten().collect()
}

async fn read_normalized<S>(store: &S, sources: &[LeadSource], options: ReadOptions) -> Vec<Lead>
where
    S: LeadStore + ?Sized,
{
    let raw = read_sources(store, sources, options).await;
    let now = Utc::now();
    raw.iter().map(|row| normalize(row, now)).collect()
}

/// Returns one page of the unified lead list.
///
/// Never fails: unavailable sources are treated as empty, so a total outage
/// yields an empty page with `total = 0`.
pub async fn fetch_leads<S>(store: &S, query: &LeadQuery, options: ReadOptions) -> LeadsPage
where
    S: LeadStore + ?Sized,
{
    let leads = read_normalized(store, &query.source.sources(), options).await;
    let page = aggregate(leads, query);

    tracing::debug!(
        total = page.total,
        page = page.page,
        page_size = page.page_size,
        returned = page.items.len(),
        "aggregated leads"
    );
    page
}

/// All leads from every source, unfiltered, for dashboard summaries.
pub async fn fetch_dashboard_leads<S>(store: &S, options: ReadOptions) -> Vec<Lead>
where
    S: LeadStore + ?Sized,
{
    read_normalized(store, &LeadSource::ALL, options).await
}

#[cfg(test)]
#[path = "read_test.rs"]
mod tests;
