use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One free-text daily summary submitted to a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyEntry {
    pub text: String,
    pub submitted_at: DateTime<Utc>,
}

impl DailyEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// Everything persisted for one conversation thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    pub thread_id: String,
    pub daily_summaries: Vec<DailyEntry>,
    pub retrospective_summary: Option<String>,
    pub actionable_insights: Option<String>,
}

impl ThreadState {
    pub fn empty(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            ..Default::default()
        }
    }
}
