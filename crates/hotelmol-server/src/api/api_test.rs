use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{Duration as ChronoDuration, Utc};
use hotelmol_core::LeadSource;
use hotelmol_db::MemoryLeadStore;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;

fn app_with(store: &MemoryLeadStore, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let state = AppState {
        store: Arc::new(store.clone()),
        read_options: ReadOptions {
            source_timeout: Duration::from_millis(200),
        },
    };
    build_app(state, auth, rate_limit)
}

fn app(store: &MemoryLeadStore) -> Router {
    app_with(store, AuthState::disabled(), RateLimitState::per_minute(1_000))
}

fn ago(duration: ChronoDuration) -> String {
    (Utc::now() - duration).to_rfc3339()
}

async fn insert(store: &MemoryLeadStore, source: LeadSource, record: Value) {
    store
        .insert(source, record.as_object().cloned().expect("object"))
        .await;
}

/// Demo 2h ago, contact 30d ago (unresponded), ROI 1h ago.
async fn scenario_store() -> MemoryLeadStore {
    let store = MemoryLeadStore::new();
    insert(
        &store,
        LeadSource::Demo,
        json!({
            "id": 5,
            "name": "Example User",
            "email": "example@hotel.com",
            "hotel_name": "Grand Plaza",
            "form_type": "demo",
            "submitted_at": ago(ChronoDuration::hours(2)),
        }),
    )
    .await;
    insert(
        &store,
        LeadSource::Contact,
        json!({
            "id": 5,
            "name": "Casey",
            "email": "casey@inn.com",
            "company": "Inn Co",
            "subject": "Integration question",
            "created_at": ago(ChronoDuration::days(30)),
        }),
    )
    .await;
    insert(
        &store,
        LeadSource::Roi,
        json!({
            "id": 5,
            "name": "Robin",
            "email": "robin@resort.com",
            "current_revenue": 50000,
            "submitted_at": ago(ChronoDuration::hours(1)),
        }),
    )
    .await;
    store
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json parse")
    };
    (status, json)
}

fn item_keys(json: &Value) -> Vec<(String, i64)> {
    json["data"]["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| {
            (
                item["source"].as_str().unwrap_or_default().to_string(),
                item["id"].as_i64().unwrap_or_default(),
            )
        })
        .collect()
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_unknown_code_maps_to_internal_error() {
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// -------------------------------------------------------------------------
// Health
// -------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok() {
    let store = MemoryLeadStore::new();
    let (status, json) = send(app(&store), "GET", "/api/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn health_reports_degraded_when_store_is_down() {
    let store = MemoryLeadStore::new();
    store.go_offline().await;

    let (status, json) = send(app(&store), "GET", "/api/v1/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["data"]["status"], "degraded");
    assert_eq!(json["data"]["database"], "unavailable");
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let store = MemoryLeadStore::new();
    let response = app(&store)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
}

// -------------------------------------------------------------------------
// Listing
// -------------------------------------------------------------------------

#[tokio::test]
async fn list_leads_returns_newest_first_with_recency_flags() {
    let store = scenario_store().await;

    let (status, json) = send(
        app(&store),
        "GET",
        "/api/v1/leads?source=all&show_responded=true&sort_dir=desc&page=1&page_size=10",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(
        item_keys(&json),
        vec![
            ("roi".to_string(), 5),
            ("demo".to_string(), 5),
            ("contact".to_string(), 5)
        ]
    );
    let items = json["data"]["items"].as_array().expect("items");
    assert_eq!(items[0]["is_new"], true);
    assert_eq!(items[1]["is_new"], true);
    assert_eq!(items[2]["is_new"], false);
    assert_eq!(items[0]["detail"], "ROI: 50000");
    assert!(items[1]["responded_at"].is_null());
    assert!(items[1]["calculated_roi"].is_null());
}

#[tokio::test]
async fn list_leads_search_matches_name() {
    let store = scenario_store().await;

    let (status, json) = send(app(&store), "GET", "/api/v1/leads?search=Example").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(item_keys(&json), vec![("demo".to_string(), 5)]);
}

#[tokio::test]
async fn list_leads_hides_responded_contacts() {
    let store = scenario_store().await;
    hotelmol_db::mark_lead_responded(&store, 5)
        .await
        .expect("mark responded");

    let (status, json) = send(
        app(&store),
        "GET",
        "/api/v1/leads?source=contact&show_responded=false",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 0);
    assert_eq!(json["data"]["items"], json!([]));
}

#[tokio::test]
async fn list_leads_ignores_malformed_query_values() {
    let store = scenario_store().await;

    let (status, json) = send(
        app(&store),
        "GET",
        "/api/v1/leads?source=nope&sort_dir=up&page=x&date_from=yesterday",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["page"], 1);
}

#[tokio::test]
async fn list_leads_survives_total_outage() {
    let store = scenario_store().await;
    store.go_offline().await;

    let (status, json) = send(app(&store), "GET", "/api/v1/leads").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 0);
}

// -------------------------------------------------------------------------
// Dashboard summaries
// -------------------------------------------------------------------------

#[tokio::test]
async fn stats_count_total_and_new_leads() {
    let store = scenario_store().await;

    let (status, json) = send(app(&store), "GET", "/api/v1/leads/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_leads"], 3);
    assert_eq!(json["data"]["new_leads"], 2);
}

#[tokio::test]
async fn daily_counts_cover_requested_window() {
    let store = scenario_store().await;

    let (status, json) = send(app(&store), "GET", "/api/v1/leads/daily?days=7").await;

    assert_eq!(status, StatusCode::OK);
    let total: i64 = json["data"]
        .as_array()
        .expect("daily array")
        .iter()
        .filter_map(|day| day["count"].as_i64())
        .sum();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn latest_respects_limit() {
    let store = scenario_store().await;

    let (status, json) = send(app(&store), "GET", "/api/v1/leads/latest?limit=2").await;

    assert_eq!(status, StatusCode::OK);
    let latest = json["data"].as_array().expect("latest array");
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0]["source"], "roi");
    assert_eq!(latest[1]["source"], "demo");
}

// -------------------------------------------------------------------------
// Mutations
// -------------------------------------------------------------------------

#[tokio::test]
async fn mark_responded_returns_no_content_and_is_repeatable() {
    let store = scenario_store().await;
    let app = app(&store);

    let (first, _) = send(app.clone(), "POST", "/api/v1/leads/contact/5/responded").await;
    let (second, _) = send(app, "POST", "/api/v1/leads/contact/5/responded").await;

    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);
    let rows = store.rows(LeadSource::Contact).await;
    assert!(rows[0]["responded_at"].is_string());
}

#[tokio::test]
async fn mark_responded_unknown_id_is_not_found() {
    let store = scenario_store().await;

    let (status, json) = send(app(&store), "POST", "/api/v1/leads/contact/77/responded").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn mark_responded_storage_failure_is_internal_error() {
    let store = scenario_store().await;
    store.fail_source(LeadSource::Contact).await;

    let (status, json) = send(app(&store), "POST", "/api/v1/leads/contact/5/responded").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "internal_error");
}

#[tokio::test]
async fn delete_only_removes_addressed_source() {
    let store = scenario_store().await;
    let app = app(&store);

    let (status, _) = send(app.clone(), "DELETE", "/api/v1/leads/demo/5").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, json) = send(app.clone(), "GET", "/api/v1/leads").await;
    assert_eq!(
        item_keys(&json),
        vec![("roi".to_string(), 5), ("contact".to_string(), 5)]
    );

    let (again, _) = send(app, "DELETE", "/api/v1/leads/demo/5").await;
    assert_eq!(again, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_rejects_unknown_source() {
    let store = scenario_store().await;

    let (status, json) = send(app(&store), "DELETE", "/api/v1/leads/webinar/5").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn delete_rejects_non_numeric_id() {
    let store = scenario_store().await;

    let (status, json) = send(app(&store), "DELETE", "/api/v1/leads/demo/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

// -------------------------------------------------------------------------
// Auth and rate limiting
// -------------------------------------------------------------------------

#[tokio::test]
async fn protected_routes_require_bearer_token_when_enabled() {
    let store = scenario_store().await;
    let auth = AuthState::from_keys("secret-key", false).expect("auth");
    let app = app_with(&store, auth, RateLimitState::per_minute(1_000));

    let (status, json) = send(app.clone(), "GET", "/api/v1/leads").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/leads")
                .header("authorization", "Bearer secret-key")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let (health, _) = send(app, "GET", "/api/v1/health").await;
    assert_eq!(health, StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_rejects_requests_over_the_window_budget() {
    let store = scenario_store().await;
    let app = app_with(&store, AuthState::disabled(), RateLimitState::per_minute(1));

    let (first, _) = send(app.clone(), "GET", "/api/v1/leads/stats").await;
    let (second, json) = send(app, "GET", "/api/v1/leads/stats").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
}
