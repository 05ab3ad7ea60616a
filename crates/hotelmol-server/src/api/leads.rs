use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use hotelmol_core::{
    leads::{DEFAULT_DAILY_WINDOW_DAYS, DEFAULT_LATEST_LIMIT},
    DailyLeadCount, LatestLead, LeadQuery, LeadSource, LeadStats, LeadsPage, SortDir,
    SourceFilter,
};
use hotelmol_db::LeadMutationError;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_DAILY_WINDOW_DAYS: i64 = 365;
const MAX_LATEST_LIMIT: usize = 50;

/// Raw list query. Every field is parsed leniently so a bad value never
/// rejects the request.
#[derive(Debug, Default, Deserialize)]
pub(super) struct LeadsQuery {
    pub source: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub search: Option<String>,
    pub show_responded: Option<String>,
    pub sort_dir: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl LeadsQuery {
    fn into_lead_query(self) -> LeadQuery {
        let base = LeadQuery {
            source: self
                .source
                .as_deref()
                .map_or(SourceFilter::All, SourceFilter::parse_lenient),
            search_term: self.search,
            show_responded: self.show_responded.as_deref().is_none_or(parse_flag),
            sort_dir: self
                .sort_dir
                .as_deref()
                .map_or(SortDir::Desc, SortDir::parse_lenient),
            ..LeadQuery::default()
        };

        base.with_date_bounds(self.date_from.as_deref(), self.date_to.as_deref())
            .with_paging(parse_int(self.page.as_deref()), parse_int(self.page_size.as_deref()))
    }
}

/// Anything other than an explicit "off" value counts as `true`.
fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}

#[derive(Debug, Deserialize)]
pub(super) struct DailyQuery {
    pub days: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LatestQuery {
    pub limit: Option<String>,
}

pub(super) fn normalize_days(days: Option<i64>) -> i64 {
    days.unwrap_or(DEFAULT_DAILY_WINDOW_DAYS)
        .clamp(1, MAX_DAILY_WINDOW_DAYS)
}

pub(super) fn normalize_latest_limit(limit: Option<i64>) -> usize {
    limit.map_or(DEFAULT_LATEST_LIMIT, |l| {
        usize::try_from(l).unwrap_or(1).clamp(1, MAX_LATEST_LIMIT)
    })
}

fn parse_lead_id(request_id: &str, raw: &str) -> Result<i64, ApiError> {
    raw.trim().parse().map_err(|_| {
        ApiError::new(
            request_id,
            "bad_request",
            format!("invalid lead id '{raw}'"),
        )
    })
}

fn map_mutation_error(request_id: String, error: &LeadMutationError) -> ApiError {
    match error {
        LeadMutationError::NotFound { .. } => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        LeadMutationError::Storage { .. } => {
            ApiError::new(request_id, "internal_error", error.to_string())
        }
    }
}

pub(super) async fn list_leads(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LeadsQuery>,
) -> Json<ApiResponse<LeadsPage>> {
    let query = query.into_lead_query();
    let data = hotelmol_db::fetch_leads(state.store.as_ref(), &query, state.read_options).await;

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn lead_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<LeadStats>> {
    let leads =
        hotelmol_db::fetch_dashboard_leads(state.store.as_ref(), state.read_options).await;

    Json(ApiResponse {
        data: hotelmol_core::summarize(&leads),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn daily_lead_counts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DailyQuery>,
) -> Json<ApiResponse<Vec<DailyLeadCount>>> {
    let days = normalize_days(parse_int(query.days.as_deref()));
    let leads =
        hotelmol_db::fetch_dashboard_leads(state.store.as_ref(), state.read_options).await;

    Json(ApiResponse {
        data: hotelmol_core::daily_counts(&leads, Utc::now(), days),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn latest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LatestQuery>,
) -> Json<ApiResponse<Vec<LatestLead>>> {
    let limit = normalize_latest_limit(parse_int(query.limit.as_deref()));
    let leads =
        hotelmol_db::fetch_dashboard_leads(state.store.as_ref(), state.read_options).await;

    Json(ApiResponse {
        data: hotelmol_core::latest_leads(&leads, limit),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn mark_responded(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_lead_id(&req_id.0, &id)?;

    hotelmol_db::mark_lead_responded(state.store.as_ref(), id)
        .await
        .map_err(|e| map_mutation_error(req_id.0.clone(), &e))?;

    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((source, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let source: LeadSource = source
        .parse()
        .map_err(|e: hotelmol_core::leads::UnknownLeadSource| {
            ApiError::new(req_id.0.clone(), "bad_request", e.to_string())
        })?;
    let id = parse_lead_id(&req_id.0, &id)?;

    hotelmol_db::delete_lead(state.store.as_ref(), source, id)
        .await
        .map_err(|e| map_mutation_error(req_id.0.clone(), &e))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_days_applies_defaults_and_bounds() {
        assert_eq!(normalize_days(None), 30);
        assert_eq!(normalize_days(Some(0)), 1);
        assert_eq!(normalize_days(Some(1_000)), 365);
        assert_eq!(normalize_days(Some(7)), 7);
    }

    #[test]
    fn normalize_latest_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_latest_limit(None), 5);
        assert_eq!(normalize_latest_limit(Some(-3)), 1);
        assert_eq!(normalize_latest_limit(Some(500)), 50);
        assert_eq!(normalize_latest_limit(Some(12)), 12);
    }

    #[test]
    fn leads_query_defaults_when_empty() {
        assert_eq!(LeadsQuery::default().into_lead_query(), LeadQuery::default());
    }

    #[test]
    fn leads_query_ignores_unknown_values() {
        let query = LeadsQuery {
            source: Some("webinar".to_string()),
            sort_dir: Some("sideways".to_string()),
            page: Some("abc".to_string()),
            page_size: Some("-4".to_string()),
            date_from: Some("not-a-date".to_string()),
            ..LeadsQuery::default()
        }
        .into_lead_query();

        assert_eq!(query.source, SourceFilter::All);
        assert_eq!(query.sort_dir, SortDir::Desc);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 1);
        assert!(query.date_from.is_none());
    }

    #[test]
    fn leads_query_maps_explicit_values() {
        let query = LeadsQuery {
            source: Some("contact".to_string()),
            show_responded: Some("false".to_string()),
            sort_dir: Some("asc".to_string()),
            page: Some("3".to_string()),
            page_size: Some("15".to_string()),
            search: Some("inn".to_string()),
            ..LeadsQuery::default()
        }
        .into_lead_query();

        assert_eq!(query.source, SourceFilter::Only(LeadSource::Contact));
        assert!(!query.show_responded);
        assert_eq!(query.sort_dir, SortDir::Asc);
        assert_eq!(query.page, 3);
        assert_eq!(query.page_size, 15);
        assert_eq!(query.search_term.as_deref(), Some("inn"));
    }

    #[test]
    fn parse_flag_treats_unknown_as_true() {
        assert!(parse_flag("true"));
        assert!(parse_flag("maybe"));
        assert!(!parse_flag("False"));
        assert!(!parse_flag("0"));
    }
}
