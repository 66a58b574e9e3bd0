use retro_core::ipc::{RetroRequest, RetroResponse};
use retro_core::RetroError;
use serde_json::json;

use crate::context::AppContext;
use crate::subsystems::alerts::{self, GroupingParams};
use crate::subsystems::daily::{self, RetrospectiveOutcome, NO_ENTRIES};
use crate::subsystems::insights;

pub const RETROSPECTIVE_FAILED: &str = "Failed to generate summary";
pub const INSIGHTS_FAILED: &str = "Failed to generate actionable insights";

pub async fn handle_request(request: RetroRequest, ctx: &AppContext) -> RetroResponse {
    match request {
        RetroRequest::Ping => RetroResponse::pong(),
        RetroRequest::Health => RetroResponse::ok(json!({
            "status": "healthy",
            "store": ctx.store.backend_name(),
            "llm": ctx.summarizer.name(),
        })),
        RetroRequest::SubmitDaily { text, thread_id } => {
            match daily::submit_daily(ctx, &text, thread_id).await {
                Ok(count) => RetroResponse::ok(json!({
                    "message": "Daily summary submitted successfully.",
                    "current_summary_count": count,
                })),
                Err(e) => error_response(None, e),
            }
        }
        RetroRequest::Retrospective { thread_id } => {
            match daily::generate_retrospective(ctx, thread_id).await {
                Ok(RetrospectiveOutcome::NoEntries) => RetroResponse::ok(json!({
                    "summary": NO_ENTRIES,
                    "details": [],
                })),
                Ok(RetrospectiveOutcome::Generated {
                    summary,
                    source_summary_count,
                }) => RetroResponse::ok(json!({
                    "summary": summary,
                    "source_summary_count": source_summary_count,
                })),
                Err(e) => error_response(Some(RETROSPECTIVE_FAILED), e),
            }
        }
        RetroRequest::Insights { summary, thread_id } => {
            match insights::generate_insights(ctx, &summary, thread_id).await {
                Ok(text) => RetroResponse::ok(json!({
                    "summary_id": summary.summary_id,
                    "actionable_insights": text,
                })),
                Err(e) => error_response(Some(INSIGHTS_FAILED), e),
            }
        }
        RetroRequest::GroupAlerts {
            alerts,
            noisy_threshold_count,
            max_alerts_per_summary,
            self_resolved_minutes,
            seed,
        } => {
            let params = GroupingParams {
                noisy_threshold_count,
                max_alerts_per_summary,
                self_resolved_minutes,
                seed,
            };
            grouped_response(alerts::group_alerts(ctx, alerts, &params))
        }
        RetroRequest::MockSummaries {
            count,
            seed,
            noisy_threshold_count,
            max_alerts_per_summary,
            self_resolved_minutes,
        } => {
            let params = GroupingParams {
                noisy_threshold_count,
                max_alerts_per_summary,
                self_resolved_minutes,
                seed,
            };
            grouped_response(alerts::mock_summaries(ctx, count, &params))
        }
        RetroRequest::MockDaily { date, items, seed } => {
            match alerts::mock_daily(ctx, date, items, seed) {
                Ok(day) => match serde_json::to_value(day) {
                    Ok(value) => RetroResponse::ok(value),
                    Err(e) => RetroResponse::err(e.to_string()),
                },
                Err(e) => error_response(None, e),
            }
        }
    }
}

fn grouped_response(result: Result<alerts::GroupedAlerts, RetroError>) -> RetroResponse {
    match result.and_then(|g| {
        serde_json::to_value(g).map_err(|e| RetroError::Other(e.to_string()))
    }) {
        Ok(value) => RetroResponse::ok(value),
        Err(e) => error_response(None, e),
    }
}

/// Classify a failure. LLM errors report as unavailable, prefixed with
/// `context` when given.
pub fn error_response(context: Option<&str>, error: RetroError) -> RetroResponse {
    let message = |e: &dyn std::fmt::Display| match context {
        Some(c) => format!("{}: {}", c, e),
        None => e.to_string(),
    };
    match error {
        RetroError::InvalidArgument(msg) => RetroResponse::invalid(msg),
        RetroError::Llm(e) => {
            tracing::warn!(error = %e, "LLM request failed");
            RetroResponse::unavailable(message(&e))
        }
        other => {
            tracing::error!(error = %other, "Request failed");
            RetroResponse::err(message(&other))
        }
    }
}
