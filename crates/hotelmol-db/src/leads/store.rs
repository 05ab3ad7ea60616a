use futures::future::BoxFuture;
use hotelmol_core::{LeadSource, RawLead};

use crate::DbError;

/// Data access for the three lead tables.
///
/// Mutations return the number of affected rows; callers decide whether zero
/// means "not found".
pub trait LeadStore: Send + Sync {
    /// All rows of one source, newest first.
    fn list(&self, source: LeadSource) -> BoxFuture<'_, Result<Vec<RawLead>, DbError>>;

    /// Sets `responded_at` to now on a contact submission.
    fn mark_responded(&self, id: i64) -> BoxFuture<'_, Result<u64, DbError>>;

    /// Permanently removes one row from the table owned by `source`.
    fn delete(&self, source: LeadSource, id: i64) -> BoxFuture<'_, Result<u64, DbError>>;

    fn ping(&self) -> BoxFuture<'_, Result<(), DbError>>;
}
