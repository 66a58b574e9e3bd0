pub mod alert;
pub mod summary;
pub mod thread;

pub use alert::{AlertItem, AlertStatus, GraphAnalysis, NodeAnalysis};
pub use summary::{RetrospectiveSummary, SummaryStats, TagCount};
pub use thread::{DailyEntry, ThreadState};
