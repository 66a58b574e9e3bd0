//! Actionable insights for one retrospective summary.

use retro_core::llm::strip_json_fence;
use retro_core::prompts::{insights_prompt, PromptPlan};
use retro_core::{RetroError, RetrospectiveSummary};

use crate::context::AppContext;

/// Ask the model for insights on `summary` and store them on the thread.
///
/// A summary without alerts answers with a fixed message and no model call.
pub async fn generate_insights(
    ctx: &AppContext,
    summary: &RetrospectiveSummary,
    thread_id: Option<String>,
) -> Result<String, RetroError> {
    let limit = ctx.config.alerts.insight_alert_limit;
    let insights = match insights_prompt(summary, limit) {
        PromptPlan::Fixed(text) => text.to_string(),
        PromptPlan::Prompt(prompt) => {
            tracing::debug!(
                summary_id = %summary.summary_id,
                items = summary.items.len(),
                "Requesting actionable insights"
            );
            let raw = ctx.summarizer.summarize(&prompt).await?;
            strip_json_fence(&raw).to_string()
        }
    };

    let thread = ctx.thread_id(thread_id);
    ctx.store.set_insights(&thread, &insights).await?;
    Ok(insights)
}
