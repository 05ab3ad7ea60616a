//! Lead triage commands. Every command prints pretty JSON on stdout.

use chrono::Utc;
use clap::{Args, Subcommand};
use hotelmol_core::{LeadQuery, LeadSource, SortDir, SourceFilter};
use hotelmol_db::{LeadMutationError, PgLeadStore, ReadOptions};
use serde::Serialize;

/// Sub-commands available under `leads`.
#[derive(Debug, Subcommand)]
pub enum LeadsCommands {
    /// List leads from every source, newest first
    List(ListArgs),
    /// Mark a contact lead as responded
    Respond {
        /// Contact submission id
        id: i64,
    },
    /// Permanently delete a lead
    Delete { source: LeadSource, id: i64 },
    /// Totals, last 30 days and latest activity
    Stats,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only read one source (demo, contact or roi)
    #[arg(long)]
    pub source: Option<LeadSource>,
    /// Case-insensitive match on name, email or company
    #[arg(long)]
    pub search: Option<String>,
    /// Inclusive lower bound (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub from: Option<String>,
    /// Inclusive upper bound (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub to: Option<String>,
    /// Hide contact leads that already have a response
    #[arg(long)]
    pub hide_responded: bool,
    /// Oldest first
    #[arg(long)]
    pub asc: bool,
    #[arg(long, default_value = "1")]
    pub page: i64,
    #[arg(long, default_value = "20")]
    pub page_size: i64,
}

impl ListArgs {
    pub(crate) fn to_query(&self) -> LeadQuery {
        LeadQuery {
            source: self.source.map_or(SourceFilter::All, SourceFilter::Only),
            search_term: self.search.clone(),
            show_responded: !self.hide_responded,
            sort_dir: if self.asc { SortDir::Asc } else { SortDir::Desc },
            ..LeadQuery::default()
        }
        .with_date_bounds(self.from.as_deref(), self.to.as_deref())
        .with_paging(Some(self.page), Some(self.page_size))
    }
}

#[derive(Debug, Serialize)]
struct MutationOutcome {
    source: LeadSource,
    id: i64,
    action: &'static str,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    totals: hotelmol_core::LeadStats,
    daily: Vec<hotelmol_core::DailyLeadCount>,
    latest: Vec<hotelmol_core::LatestLead>,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn mutation_result(
    result: Result<(), LeadMutationError>,
    outcome: MutationOutcome,
) -> anyhow::Result<()> {
    result?;
    print_json(&outcome)
}

/// Dispatches a `leads` sub-command against Postgres.
///
/// # Errors
///
/// Returns an error if a mutation fails or output cannot be serialized. Read
/// commands degrade to empty results instead of failing.
pub(crate) async fn run(
    pool: sqlx::PgPool,
    config: &hotelmol_core::AppConfig,
    command: LeadsCommands,
) -> anyhow::Result<()> {
    let store = PgLeadStore::new(pool);
    let options = ReadOptions::from_app_config(config);

    match command {
        LeadsCommands::List(args) => {
            let page = hotelmol_db::fetch_leads(&store, &args.to_query(), options).await;
            print_json(&page)
        }
        LeadsCommands::Respond { id } => mutation_result(
            hotelmol_db::mark_lead_responded(&store, id).await,
            MutationOutcome {
                source: LeadSource::Contact,
                id,
                action: "responded",
            },
        ),
        LeadsCommands::Delete { source, id } => mutation_result(
            hotelmol_db::delete_lead(&store, source, id).await,
            MutationOutcome {
                source,
                id,
                action: "deleted",
            },
        ),
        LeadsCommands::Stats => {
            let leads = hotelmol_db::fetch_dashboard_leads(&store, options).await;
            print_json(&StatsReport {
                totals: hotelmol_core::summarize(&leads),
                daily: hotelmol_core::daily_counts(
                    &leads,
                    Utc::now(),
                    hotelmol_core::leads::DEFAULT_DAILY_WINDOW_DAYS,
                ),
                latest: hotelmol_core::latest_leads(
                    &leads,
                    hotelmol_core::leads::DEFAULT_LATEST_LIMIT,
                ),
            })
        }
    }
}
