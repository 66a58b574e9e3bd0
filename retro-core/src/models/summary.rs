use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::alert::AlertItem;

/// A bounded, tagged group of alerts produced by one grouping run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrospectiveSummary {
    pub summary_id: String,
    pub tags: BTreeSet<String>,
    pub items: Vec<AlertItem>,
    pub generated_at: DateTime<Utc>,
}

impl RetrospectiveSummary {
    pub fn new(tags: BTreeSet<String>, items: Vec<AlertItem>) -> Self {
        Self {
            summary_id: Uuid::new_v4().to_string(),
            tags,
            items,
            generated_at: Utc::now(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for RetrospectiveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        write!(
            f,
            "RetrospectiveSummary(id='{}', tags={:?}, item_count={}, generated_at='{}')",
            self.summary_id,
            tags,
            self.items.len(),
            self.generated_at.to_rfc3339()
        )
    }
}

/// Per-tag counts and flag totals over a set of summaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub summary_count: usize,
    pub alert_count: usize,
    pub noisy_count: usize,
    pub self_resolved_count: usize,
    /// Alerts per summary tag, highest first.
    pub top_tags: Vec<TagCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}
