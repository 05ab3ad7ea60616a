//! Staff mutations on leads. Failures are always surfaced to the caller.

use hotelmol_core::LeadSource;
use thiserror::Error;

use super::store::LeadStore;
use crate::DbError;

#[derive(Debug, Error)]
pub enum LeadMutationError {
    #[error("{lead_source} lead {id} not found")]
    NotFound { lead_source: LeadSource, id: i64 },
    #[error("failed to {action} {lead_source} lead {id}")]
    Storage {
        action: &'static str,
        lead_source: LeadSource,
        id: i64,
        #[source]
        error: DbError,
    },
}

impl LeadMutationError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, LeadMutationError::NotFound { .. })
    }
}

/// Sets `responded_at` on a contact lead. Repeat calls succeed and leave it set.
///
/// # Errors
///
/// Returns [`LeadMutationError::NotFound`] if no contact lead has `id`, or
/// [`LeadMutationError::Storage`] if the update fails.
pub async fn mark_lead_responded<S>(store: &S, id: i64) -> Result<(), LeadMutationError>
where
    S: LeadStore + ?Sized,
{
    let lead_source = LeadSource::Contact;
    match store.mark_responded(id).await {
        Ok(0) => Err(LeadMutationError::NotFound { lead_source, id }),
        Ok(_) => {
            tracing::info!(source = %lead_source, id, "lead marked as responded");
            Ok(())
        }
        Err(error) => {
            tracing::error!(source = %lead_source, id, error = %error, "mark responded failed");
            Err(LeadMutationError::Storage {
                action: "mark responded",
                lead_source,
                id,
                error,
            })
        }
    }
}

/// Permanently deletes `(lead_source, id)`. Other sources sharing `id` are untouched.
///
/// # Errors
///
/// Returns [`LeadMutationError::NotFound`] if the row does not exist, or
/// [`LeadMutationError::Storage`] if the delete fails.
pub async fn delete_lead<S>(
    store: &S,
    lead_source: LeadSource,
    id: i64,
) -> Result<(), LeadMutationError>
where
    S: LeadStore + ?Sized,
{
    match store.delete(lead_source, id).await {
        Ok(0) => Err(LeadMutationError::NotFound { lead_source, id }),
        Ok(_) => {
            tracing::info!(source = %lead_source, id, "lead deleted");
            Ok(())
        }
        Err(error) => {
            tracing::error!(source = %lead_source, id, error = %error, "delete lead failed");
            Err(LeadMutationError::Storage {
                action: "delete",
                lead_source,
                id,
                error,
            })
        }
    }
}
