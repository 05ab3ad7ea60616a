//! Postgres-backed [`LeadStore`].
//!
//! Rows are read as `to_jsonb(t)` so that older table revisions with missing or
//! renamed columns still load; the core field map decides which column wins.

use futures::future::BoxFuture;
use hotelmol_core::{leads::FieldMap, LeadSource, RawLead};
use serde_json::Value;
use sqlx::PgPool;

use super::store::LeadStore;
use crate::DbError;

#[derive(Debug, Clone)]
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Builds the newest-first select for one source.
///
/// Ordering uses the same `created_at` candidates as normalization.
fn list_sql(source: LeadSource) -> String {
    let order_keys = FieldMap::for_source(source)
        .created_at
        .iter()
        .map(|key| format!("s.record->>'{key}'"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT s.record \
         FROM (SELECT to_jsonb(t) AS record FROM {table} t) s \
         ORDER BY COALESCE({order_keys}) DESC NULLS LAST, s.record->'id' DESC",
        table = source.table(),
    )
}

async fn list_rows(pool: &PgPool, source: LeadSource) -> Result<Vec<RawLead>, DbError> {
    let sql = list_sql(source);
    let rows = sqlx::query_scalar::<_, Value>(&sql).fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match row {
            Value::Object(record) => Some(RawLead::new(source, record)),
            _ => None,
        })
        .collect())
}

async fn mark_contact_responded(pool: &PgPool, id: i64) -> Result<u64, DbError> {
    let result = sqlx::query("UPDATE contact_forms SET responded_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

async fn delete_row(pool: &PgPool, source: LeadSource, id: i64) -> Result<u64, DbError> {
    let sql = format!("DELETE FROM {} WHERE id = $1", source.table());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;

    Ok(result.rows_affected())
}

impl LeadStore for PgLeadStore {
    fn list(&self, source: LeadSource) -> BoxFuture<'_, Result<Vec<RawLead>, DbError>> {
        Box::pin(list_rows(&self.pool, source))
    }

    fn mark_responded(&self, id: i64) -> BoxFuture<'_, Result<u64, DbError>> {
        Box::pin(mark_contact_responded(&self.pool, id))
    }

    fn delete(&self, source: LeadSource, id: i64) -> BoxFuture<'_, Result<u64, DbError>> {
        Box::pin(delete_row(&self.pool, source, id))
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), DbError>> {
        Box::pin(crate::health_check(&self.pool))
    }
}
