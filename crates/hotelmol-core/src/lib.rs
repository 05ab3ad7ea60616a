mod app_config;
mod config;
pub mod leads;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use leads::{
    aggregate, daily_counts, latest_leads, normalize, summarize, DailyLeadCount, LatestLead, Lead,
    LeadQuery, LeadSource, LeadStats, LeadsPage, RawLead, SortDir, SourceFilter,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
