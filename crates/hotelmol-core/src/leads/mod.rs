//! Unified lead model over the demo, contact and ROI intake tables.

mod field_map;
mod instant;
mod normalize;
mod query;
mod summary;
mod types;

pub use field_map::{FieldMap, CONTACT_FIELDS, DEMO_FIELDS, ROI_FIELDS};
pub use instant::parse_instant;
pub use normalize::{
    is_recent, normalize, truncate_chars, DETAIL_MAX_CHARS, RECENT_WINDOW_HOURS,
};
pub use query::{aggregate, LeadQuery, SortDir, SourceFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use summary::{
    daily_counts, latest_leads, summarize, DEFAULT_DAILY_WINDOW_DAYS, DEFAULT_LATEST_LIMIT,
};
pub use types::{
    DailyLeadCount, LatestLead, Lead, LeadSource, LeadStats, LeadsPage, RawLead,
    UnknownLeadSource,
};
