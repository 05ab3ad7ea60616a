//! In-process [`LeadStore`] for tests and offline runs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use hotelmol_core::{LeadSource, RawLead};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::store::LeadStore;
use crate::DbError;

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<LeadSource, Vec<Map<String, Value>>>,
    failing: HashSet<LeadSource>,
    delays: HashMap<LeadSource, Duration>,
    reads: HashMap<LeadSource, usize>,
    offline: bool,
}

/// Rows are listed most recent insert first.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeadStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryLeadStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, source: LeadSource, record: Map<String, Value>) {
        self.tables
            .lock()
            .await
            .rows
            .entry(source)
            .or_default()
            .push(record);
    }

    /// Makes every read of `source` fail, as if its table were missing.
    pub async fn fail_source(&self, source: LeadSource) {
        self.tables.lock().await.failing.insert(source);
    }

    /// Fails health checks and every source, as if the database were down.
    pub async fn go_offline(&self) {
        let mut tables = self.tables.lock().await;
        tables.offline = true;
        tables.failing.extend(LeadSource::ALL);
    }

    /// Delays every read of `source` by `delay`.
    pub async fn delay_source(&self, source: LeadSource, delay: Duration) {
        self.tables.lock().await.delays.insert(source, delay);
    }

    pub async fn rows(&self, source: LeadSource) -> Vec<Map<String, Value>> {
        self.tables
            .lock()
            .await
            .rows
            .get(&source)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `list` calls made for `source`, including failed ones.
    pub async fn read_count(&self, source: LeadSource) -> usize {
        self.tables
            .lock()
            .await
            .reads
            .get(&source)
            .copied()
            .unwrap_or_default()
    }

    async fn list_rows(&self, source: LeadSource) -> Result<Vec<RawLead>, DbError> {
        let (delay, result) = {
            let mut tables = self.tables.lock().await;
            *tables.reads.entry(source).or_default() += 1;
            let delay = tables.delays.get(&source).copied();
            let result = if tables.failing.contains(&source) {
                Err(DbError::Unavailable(source.table().to_owned()))
            } else {
                Ok(tables
                    .rows
                    .get(&source)
                    .map(|rows| {
                        rows.iter()
                            .rev()
                            .map(|record| RawLead::new(source, record.clone()))
                            .collect()
                    })
                    .unwrap_or_default())
            };
            (delay, result)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn update_responded(&self, id: i64) -> Result<u64, DbError> {
        let mut tables = self.tables.lock().await;
        if tables.failing.contains(&LeadSource::Contact) {
            return Err(DbError::Unavailable(LeadSource::Contact.table().to_owned()));
        }

        let now = Value::String(Utc::now().to_rfc3339());
        let mut affected = 0;
        for record in tables
            .rows
            .entry(LeadSource::Contact)
            .or_default()
            .iter_mut()
            .filter(|record| record_id(record) == Some(id))
        {
            record.insert("responded_at".to_owned(), now.clone());
            affected += 1;
        }
        Ok(affected)
    }

    async fn remove(&self, source: LeadSource, id: i64) -> Result<u64, DbError> {
        let mut tables = self.tables.lock().await;
        if tables.failing.contains(&source) {
            return Err(DbError::Unavailable(source.table().to_owned()));
        }

        let rows = tables.rows.entry(source).or_default();
        let before = rows.len();
        rows.retain(|record| record_id(record) != Some(id));
        Ok(u64::try_from(before - rows.len()).unwrap_or_default())
    }
}

fn record_id(record: &Map<String, Value>) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

impl LeadStore for MemoryLeadStore {
    fn list(&self, source: LeadSource) -> BoxFuture<'_, Result<Vec<RawLead>, DbError>> {
        Box::pin(self.list_rows(source))
    }

    fn mark_responded(&self, id: i64) -> BoxFuture<'_, Result<u64, DbError>> {
        Box::pin(self.update_responded(id))
    }

    fn delete(&self, source: LeadSource, id: i64) -> BoxFuture<'_, Result<u64, DbError>> {
        Box::pin(self.remove(source, id))
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), DbError>> {
        Box::pin(async {
            if self.tables.lock().await.offline {
                return Err(DbError::Unavailable("lead store".to_owned()));
            }
            Ok(())
        })
    }
}
