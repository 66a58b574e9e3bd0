//! Retro HTTP REST API
//!
//! Axum-based HTTP server exposing daily-summary intake, retrospectives,
//! actionable insights and alert grouping. Runs alongside the Unix socket IPC
//! server on port 5000 (configurable).
//!
//! Each endpoint has a thin axum handler that delegates to an inner function
//! returning `(StatusCode, Value)`; the inner functions go through the same
//! router as IPC requests.
//!
//! Endpoints:
//! - GET  /health: liveness and store backend
//! - GET  /version: server version info
//! - POST /api/submit_daily: append a daily summary to a thread
//! - GET  /api/retrospective: summarize a thread's daily summaries
//! - POST /api/insights: actionable insights for one summary
//! - POST /api/alerts/summaries: generate, enrich and group mock alerts
//! - POST /api/alerts/group: enrich and group supplied alerts
//! - GET  /api/mock/daily: one mock day of daily-summary items

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use retro_core::ipc::{ErrorKind, RetroRequest, RetroResponse};
use retro_core::{AlertItem, RetrospectiveSummary};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::context::AppContext;
use crate::router;

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/submit_daily", post(submit_daily_handler))
        .route("/api/retrospective", get(retrospective_handler))
        .route("/api/insights", post(insights_handler))
        .route("/api/alerts/summaries", post(alert_summaries_handler))
        .route("/api/alerts/group", post(group_alerts_handler))
        .route("/api/mock/daily", get(mock_daily_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    ctx: AppContext,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", ctx.config.http.host, ctx.config.http.port);
    let app = build_router(Arc::new(ctx));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Retro HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct SubmitDailyRequest {
    pub text: Option<String>,
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ThreadQuery {
    pub thread_id: Option<String>,
}

/// A serialized summary plus the thread the insights belong to.
#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    #[serde(flatten)]
    pub summary: RetrospectiveSummary,
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AlertSummariesRequest {
    pub count: Option<i64>,
    pub seed: Option<u64>,
    pub noisy_threshold_count: Option<i64>,
    pub max_alerts_per_summary: Option<i64>,
    pub self_resolved_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GroupAlertsRequest {
    pub alerts: Vec<AlertItem>,
    pub noisy_threshold_count: Option<i64>,
    pub max_alerts_per_summary: Option<i64>,
    pub self_resolved_minutes: Option<i64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MockDailyQuery {
    pub date: Option<NaiveDate>,
    pub items: Option<i64>,
    pub seed: Option<u64>,
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub fn health_inner(ctx: &AppContext) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::OK,
        json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "store": ctx.store.backend_name(),
            "llm": ctx.summarizer.name(),
        }),
    )
}

/// Inner version: returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "retro/1",
    })
}

pub async fn submit_daily_inner(
    ctx: &AppContext,
    req: SubmitDailyRequest,
) -> (StatusCode, serde_json::Value) {
    let text = match req.text {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                json!({ "error": crate::subsystems::daily::MISSING_TEXT }),
            );
        }
    };
    let request = RetroRequest::SubmitDaily {
        text,
        thread_id: req.thread_id,
    };
    into_http(router::handle_request(request, ctx).await, StatusCode::INTERNAL_SERVER_ERROR)
}

/// LLM failures answer 500 here.
pub async fn retrospective_inner(
    ctx: &AppContext,
    query: ThreadQuery,
) -> (StatusCode, serde_json::Value) {
    let start = Instant::now();
    let request = RetroRequest::Retrospective {
        thread_id: query.thread_id,
    };
    let (status, body) = into_http(
        router::handle_request(request, ctx).await,
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    tracing::info!(
        status = status.as_u16(),
        took_ms = start.elapsed().as_millis() as u64,
        "Retrospective request served"
    );
    (status, body)
}

/// LLM failures answer 502 with `status: "unavailable"`.
pub async fn insights_inner(
    ctx: &AppContext,
    req: InsightsRequest,
) -> (StatusCode, serde_json::Value) {
    let request = RetroRequest::Insights {
        summary: req.summary,
        thread_id: req.thread_id,
    };
    into_http(router::handle_request(request, ctx).await, StatusCode::BAD_GATEWAY)
}

pub async fn alert_summaries_inner(
    ctx: &AppContext,
    req: AlertSummariesRequest,
) -> (StatusCode, serde_json::Value) {
    let request = RetroRequest::MockSummaries {
        count: req.count,
        seed: req.seed,
        noisy_threshold_count: req.noisy_threshold_count,
        max_alerts_per_summary: req.max_alerts_per_summary,
        self_resolved_minutes: req.self_resolved_minutes,
    };
    into_http(router::handle_request(request, ctx).await, StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn group_alerts_inner(
    ctx: &AppContext,
    req: GroupAlertsRequest,
) -> (StatusCode, serde_json::Value) {
    let request = RetroRequest::GroupAlerts {
        alerts: req.alerts,
        noisy_threshold_count: req.noisy_threshold_count,
        max_alerts_per_summary: req.max_alerts_per_summary,
        self_resolved_minutes: req.self_resolved_minutes,
        seed: req.seed,
    };
    into_http(router::handle_request(request, ctx).await, StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn mock_daily_inner(
    ctx: &AppContext,
    query: MockDailyQuery,
) -> (StatusCode, serde_json::Value) {
    let request = RetroRequest::MockDaily {
        date: query.date,
        items: query.items,
        seed: query.seed,
    };
    into_http(router::handle_request(request, ctx).await, StatusCode::INTERNAL_SERVER_ERROR)
}

// ============================================================================
// Axum handler wrappers (thin, delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<AppContext>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state);
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn submit_daily_handler(
    State(state): State<Arc<AppContext>>,
    Json(req): Json<SubmitDailyRequest>,
) -> impl IntoResponse {
    let (status, body) = submit_daily_inner(&state, req).await;
    (status, Json(body))
}

pub async fn retrospective_handler(
    State(state): State<Arc<AppContext>>,
    Query(query): Query<ThreadQuery>,
) -> impl IntoResponse {
    let (status, body) = retrospective_inner(&state, query).await;
    (status, Json(body))
}

pub async fn insights_handler(
    State(state): State<Arc<AppContext>>,
    Json(req): Json<InsightsRequest>,
) -> impl IntoResponse {
    let (status, body) = insights_inner(&state, req).await;
    (status, Json(body))
}

pub async fn alert_summaries_handler(
    State(state): State<Arc<AppContext>>,
    body: Option<Json<AlertSummariesRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let (status, body) = alert_summaries_inner(&state, req).await;
    (status, Json(body))
}

pub async fn group_alerts_handler(
    State(state): State<Arc<AppContext>>,
    Json(req): Json<GroupAlertsRequest>,
) -> impl IntoResponse {
    let (status, body) = group_alerts_inner(&state, req).await;
    (status, Json(body))
}

pub async fn mock_daily_handler(
    State(state): State<Arc<AppContext>>,
    Query(query): Query<MockDailyQuery>,
) -> impl IntoResponse {
    let (status, body) = mock_daily_inner(&state, query).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

/// Convert a router response into an HTTP body value, or the error kind and
/// message.
pub fn response_to_http(
    response: RetroResponse,
) -> std::result::Result<serde_json::Value, (ErrorKind, String)> {
    if response.is_ok() {
        Ok(response.data.unwrap_or(json!({})))
    } else {
        Err((
            response.error_kind.unwrap_or(ErrorKind::Internal),
            response.error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}

/// Status code for an error kind. `unavailable` answers `unavailable_status`.
pub fn status_for(kind: ErrorKind, unavailable_status: StatusCode) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::Unavailable => unavailable_status,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn into_http(
    response: RetroResponse,
    unavailable_status: StatusCode,
) -> (StatusCode, serde_json::Value) {
    match response_to_http(response) {
        Ok(data) => (StatusCode::OK, data),
        Err((kind, error)) => {
            let status = status_for(kind, unavailable_status);
            let body = match kind {
                ErrorKind::InvalidArgument => json!({ "error": error }),
                ErrorKind::Unavailable => json!({ "error": error, "status": "unavailable" }),
                ErrorKind::Internal => json!({ "error": error, "status": "error" }),
            };
            (status, body)
        }
    }
}

// ============================================================================
// Unit Tests: call inner functions directly
// ============================================================================
