//! Prompt builders for the retrospective and actionable-insight requests.

use std::fmt::Write as _;

use crate::models::{AlertItem, DailyEntry, RetrospectiveSummary};

pub const NO_DAILY_SUMMARIES: &str = "No daily summaries to process.";
pub const NO_DAILY_TEXT: &str = "No text found in daily summaries to process.";
pub const NO_ALERT_DATA: &str = "No alert data provided in the summary to generate insights.";

const ENTRY_SEPARATOR: &str = "\n\n---\n\n";

const INSIGHTS_PREAMBLE: &str = "You are an AI operations assistant. Based on the following \
retrospective summary of alerts, provide actionable insights. Focus on potential root causes, \
trends, and recommendations for investigation or improvement. Be concise and clear.\n\n";

/// What to do with a set of daily entries: either a prompt for the model,
/// or a fixed answer when there is nothing to summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPlan {
    Prompt(String),
    Fixed(&'static str),
}

pub fn retrospective_prompt(entries: &[DailyEntry]) -> PromptPlan {
    if entries.is_empty() {
        return PromptPlan::Fixed(NO_DAILY_SUMMARIES);
    }

    let texts: Vec<&str> = entries
        .iter()
        .map(|e| e.text.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    let joined = texts.join(ENTRY_SEPARATOR);
    if joined.trim().is_empty() {
        return PromptPlan::Fixed(NO_DAILY_TEXT);
    }

    PromptPlan::Prompt(format!(
        "Please provide a concise retrospective summary of the following daily entries:\n\n{}",
        joined
    ))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn write_alert(out: &mut String, index: usize, alert: &AlertItem) {
    let _ = writeln!(out, "- Alert {}:", index + 1);
    let _ = writeln!(out, "  Title: {}", alert.title);
    let _ = writeln!(out, "  Status: {}", alert.status);
    let _ = writeln!(out, "  Created: {}", alert.created_date.to_rfc3339());
    let _ = writeln!(out, "  Noisy: {}", yes_no(alert.is_noisy));
    let _ = writeln!(out, "  Self-Resolved: {}", yes_no(alert.is_self_resolved));

    let node = &alert.node_analysis;
    if !node.is_empty() {
        let value = node
            .value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "  Node Analysis: {} - {}: {}",
            node.component.as_deref().unwrap_or("N/A"),
            node.metric.as_deref().unwrap_or("N/A"),
            value
        );
    }

    let graph = &alert.graph_analysis;
    if !graph.is_empty() {
        let _ = writeln!(
            out,
            "  Graph Analysis: Impact {}, Correlated Alerts: {}",
            graph.impact_radius.as_deref().unwrap_or("N/A"),
            graph.correlated_alerts.len()
        );
    }
}

/// Flatten a summary into an insights prompt. Only the first `alert_limit`
/// alerts are detailed; the remainder is reported as a count.
pub fn insights_prompt(summary: &RetrospectiveSummary, alert_limit: usize) -> PromptPlan {
    if summary.items.is_empty() {
        return PromptPlan::Fixed(NO_ALERT_DATA);
    }

    let tags: Vec<&str> = summary.tags.iter().map(String::as_str).collect();
    let item_count = summary.items.len();

    let mut details = String::new();
    let _ = writeln!(details, "Retrospective Summary ID: {}", summary.summary_id);
    let _ = writeln!(details, "Tags: {}", tags.join(", "));
    let _ = writeln!(details, "Total Alerts: {}\n", item_count);
    details.push_str("Alerts Included:\n");

    for (i, alert) in summary.items.iter().take(alert_limit).enumerate() {
        write_alert(&mut details, i, alert);
    }
    if item_count > alert_limit {
        let _ = writeln!(details, "...and {} more alerts.", item_count - alert_limit);
    }

    PromptPlan::Prompt(format!("{}{}", INSIGHTS_PREAMBLE, details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertItem;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn entry(text: &str) -> DailyEntry {
        DailyEntry::new(text)
    }

    fn summary_with(n: usize) -> RetrospectiveSummary {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let items = (0..n)
            .map(|i| {
                let mut a = AlertItem::new(format!("a{}", i), "CPU Usage High", "closed", created)
                    .with_component("server-prod-01");
                a.node_analysis.metric = Some("CPUUtilization".to_string());
                a.node_analysis.value = Some(91.5);
                a.graph_analysis.impact_radius = Some("large".to_string());
                a.graph_analysis.correlated_alerts = vec!["x".into(), "y".into()];
                a.is_noisy = i > 0;
                a
            })
            .collect();
        let tags: BTreeSet<String> = ["status:noisy", "type:cpu"].iter().map(|t| t.to_string()).collect();
        RetrospectiveSummary::new(tags, items)
    }

    #[test]
    fn test_retrospective_prompt_joins_entries() {
        let plan = retrospective_prompt(&[entry("Day 1: planning"), entry(""), entry("Day 2: coding")]);
        match plan {
            PromptPlan::Prompt(p) => {
                assert!(p.starts_with("Please provide a concise retrospective summary"));
                assert!(p.ends_with("Day 1: planning\n\n---\n\nDay 2: coding"));
            }
            other => panic!("expected prompt, got {:?}", other),
        }
    }

    #[test]
    fn test_retrospective_prompt_fixed_answers() {
        assert_eq!(retrospective_prompt(&[]), PromptPlan::Fixed(NO_DAILY_SUMMARIES));
        assert_eq!(
            retrospective_prompt(&[entry(""), entry("   ")]),
            PromptPlan::Fixed(NO_DAILY_TEXT)
        );
    }

    #[test]
    fn test_insights_prompt_truncates_to_limit() {
        let summary = summary_with(7);
        let PromptPlan::Prompt(p) = insights_prompt(&summary, 5) else {
            panic!("expected prompt");
        };
        assert!(p.starts_with("You are an AI operations assistant."));
        assert!(p.contains("Tags: status:noisy, type:cpu"));
        assert!(p.contains("Total Alerts: 7"));
        assert!(p.contains("- Alert 5:"));
        assert!(!p.contains("- Alert 6:"));
        assert!(p.contains("...and 2 more alerts."));
        assert!(p.contains("Node Analysis: server-prod-01 - CPUUtilization: 91.5"));
        assert!(p.contains("Graph Analysis: Impact large, Correlated Alerts: 2"));
        assert!(p.contains("Noisy: No"));
        assert!(p.contains("Noisy: Yes"));
    }

    #[test]
    fn test_insights_prompt_no_remainder_line_at_limit() {
        let PromptPlan::Prompt(p) = insights_prompt(&summary_with(5), 5) else {
            panic!("expected prompt");
        };
        assert!(!p.contains("more alerts."));
    }

    #[test]
    fn test_insights_prompt_without_alerts() {
        assert_eq!(insights_prompt(&summary_with(0), 5), PromptPlan::Fixed(NO_ALERT_DATA));
    }
}
