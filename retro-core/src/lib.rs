pub mod config;
pub mod enrich;
pub mod error;
pub mod grouping;
pub mod ipc;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod resolution;
pub mod store;
pub mod tags;

pub use config::RetroConfig;
pub use enrich::{enrich_alert_items, DEFAULT_NOISY_THRESHOLD};
pub use error::{positive_count, RetroError};
pub use grouping::{
    alert_pipeline, group_alerts_into_summaries, summary_stats, DEFAULT_MAX_ALERTS_PER_SUMMARY,
};
pub use llm::{create_summarizer, DisabledSummarizer, GeminiClient, LlmError, Summarizer};
pub use models::{AlertItem, AlertStatus, DailyEntry, RetrospectiveSummary, ThreadState};
pub use resolution::{
    policy_from_config, RandomSelfResolution, ResolutionWindow, SelfResolutionPolicy,
};
pub use store::{create_store, MemoryThreadStore, PgThreadStore, ThreadStore};
pub use tags::{derive_tags, primary_tag};
