//! Lead storage: per-source table access, concurrent aggregated reads and
//! staff mutations.

mod memory;
mod postgres;
mod read;
mod store;
mod write;

pub use memory::MemoryLeadStore;
pub use postgres::PgLeadStore;
pub use read::{fetch_dashboard_leads, fetch_leads, ReadOptions};
pub use store::LeadStore;
pub use write::{delete_lead, mark_lead_responded, LeadMutationError};
