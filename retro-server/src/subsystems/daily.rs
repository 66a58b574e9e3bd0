//! Daily-summary intake and retrospective generation for a thread.

use retro_core::prompts::{retrospective_prompt, PromptPlan};
use retro_core::{DailyEntry, RetroError};

use crate::context::AppContext;

pub const MISSING_TEXT: &str = "Missing 'text' in request body";
pub const NO_ENTRIES: &str = "No daily summaries available to generate a retrospective.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrospectiveOutcome {
    /// The thread has no entries yet; nothing was generated.
    NoEntries,
    Generated {
        summary: String,
        source_summary_count: usize,
    },
}

/// Append `text` to the thread and return the thread's entry count.
pub async fn submit_daily(
    ctx: &AppContext,
    text: &str,
    thread_id: Option<String>,
) -> Result<usize, RetroError> {
    if text.trim().is_empty() {
        return Err(RetroError::invalid(MISSING_TEXT));
    }
    let thread = ctx.thread_id(thread_id);
    let count = ctx.store.append_daily(&thread, DailyEntry::new(text)).await?;
    tracing::info!(thread = %thread, count, "Daily summary submitted");
    Ok(count)
}

/// Summarize every entry in the thread and persist the result.
pub async fn generate_retrospective(
    ctx: &AppContext,
    thread_id: Option<String>,
) -> Result<RetrospectiveOutcome, RetroError> {
    let thread = ctx.thread_id(thread_id);
    let state = ctx.store.load(&thread).await?;
    if state.daily_summaries.is_empty() {
        return Ok(RetrospectiveOutcome::NoEntries);
    }

    let summary = match retrospective_prompt(&state.daily_summaries) {
        PromptPlan::Fixed(text) => text.to_string(),
        PromptPlan::Prompt(prompt) => {
            tracing::debug!(thread = %thread, llm = ctx.summarizer.name(), "Requesting retrospective");
            ctx.summarizer.summarize(&prompt).await?
        }
    };

    ctx.store.set_retrospective(&thread, &summary).await?;
    Ok(RetrospectiveOutcome::Generated {
        summary,
        source_summary_count: state.daily_summaries.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use retro_core::prompts::NO_DAILY_TEXT;
    use retro_core::{DisabledSummarizer, LlmError, MemoryThreadStore, RetroConfig, Summarizer};

    struct Echo;

    #[async_trait]
    impl Summarizer for Echo {
        async fn summarize(&self, prompt: &str) -> Result<String, LlmError> {
            Ok(format!("summary of {} chars", prompt.len()))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn ctx(summarizer: Arc<dyn Summarizer>) -> AppContext {
        AppContext::new(
            RetroConfig::default(),
            Arc::new(MemoryThreadStore::new()),
            summarizer,
        )
    }

    #[tokio::test]
    async fn test_submit_counts_per_thread() {
        let ctx = ctx(Arc::new(Echo));
        assert_eq!(submit_daily(&ctx, "first", None).await.unwrap(), 1);
        assert_eq!(submit_daily(&ctx, "second", None).await.unwrap(), 2);
        assert_eq!(submit_daily(&ctx, "other", Some("t2".into())).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_text() {
        let ctx = ctx(Arc::new(Echo));
        let err = submit_daily(&ctx, "   ", None).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_retrospective_without_entries() {
        let ctx = ctx(Arc::new(Echo));
        let outcome = generate_retrospective(&ctx, None).await.unwrap();
        assert_eq!(outcome, RetrospectiveOutcome::NoEntries);
    }

    #[tokio::test]
    async fn test_retrospective_persists_summary() {
        let ctx = ctx(Arc::new(Echo));
        submit_daily(&ctx, "Deployed v2", None).await.unwrap();
        submit_daily(&ctx, "Rolled back v2", None).await.unwrap();

        match generate_retrospective(&ctx, None).await.unwrap() {
            RetrospectiveOutcome::Generated {
                summary,
                source_summary_count,
            } => {
                assert!(summary.starts_with("summary of"));
                assert_eq!(source_summary_count, 2);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let state = ctx.store.load("global_retro_thread").await.unwrap();
        assert!(state.retrospective_summary.unwrap().starts_with("summary of"));
    }

    #[tokio::test]
    async fn test_retrospective_with_only_empty_text_skips_llm() {
        let ctx = ctx(Arc::new(DisabledSummarizer));
        ctx.store
            .append_daily("global_retro_thread", DailyEntry::new(""))
            .await
            .unwrap();
        match generate_retrospective(&ctx, None).await.unwrap() {
            RetrospectiveOutcome::Generated { summary, .. } => assert_eq!(summary, NO_DAILY_TEXT),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrospective_llm_failure_propagates() {
        let ctx = ctx(Arc::new(DisabledSummarizer));
        submit_daily(&ctx, "something", None).await.unwrap();
        let err = generate_retrospective(&ctx, None).await.unwrap_err();
        assert!(matches!(err, RetroError::Llm(LlmError::Disabled)));
    }
}
