//! Tag derivation for enriched alerts.

use std::collections::BTreeSet;

use crate::models::AlertItem;

pub const TAG_GENERAL: &str = "general";
pub const TAG_NOISY: &str = "status:noisy";
pub const TAG_SELF_RESOLVED: &str = "status:self-resolved";
pub const TAG_CPU: &str = "type:cpu";
pub const TAG_MEMORY: &str = "type:memory";

/// Title keywords (matched against the upper-cased title) and the tag each emits.
const TITLE_RULES: &[(&[&str], &str)] = &[
    (&["CPU"], TAG_CPU),
    (&["MEMORY"], TAG_MEMORY),
    (&["DISK"], "type:disk"),
    (&["NETWORK", "LATENCY"], "type:network"),
    (&["DATABASE"], "type:database"),
    (&["SECURITY"], "type:security"),
];

/// Subset of title rules reapplied when tagging a whole summary chunk.
const SUMMARY_TITLE_RULES: &[(&[&str], &str)] = &[(&["CPU"], TAG_CPU), (&["MEMORY"], TAG_MEMORY)];

pub fn component_tag(component: &str) -> String {
    format!("component:{}", component)
}

fn apply_title_rules(title: &str, rules: &[(&[&str], &str)], tags: &mut BTreeSet<String>) {
    let upper = title.to_uppercase();
    for (keywords, tag) in rules {
        if keywords.iter().any(|k| upper.contains(k)) {
            tags.insert((*tag).to_string());
        }
    }
}

/// Full tag set for one alert. Never empty: `general` is added iff no other
/// rule matched.
pub fn derive_tags(alert: &AlertItem) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();

    if let Some(component) = alert.node_analysis.component() {
        tags.insert(component_tag(component));
    }
    if alert.is_noisy {
        tags.insert(TAG_NOISY.to_string());
    }
    if alert.is_self_resolved {
        tags.insert(TAG_SELF_RESOLVED.to_string());
    }
    apply_title_rules(&alert.title, TITLE_RULES, &mut tags);

    if tags.is_empty() {
        tags.insert(TAG_GENERAL.to_string());
    }
    tags
}

/// Lexicographically smallest tag. A `BTreeSet` iterates in sorted order,
/// so this is its first element.
pub fn primary_tag(tags: &BTreeSet<String>) -> String {
    tags.iter()
        .next()
        .cloned()
        .unwrap_or_else(|| TAG_GENERAL.to_string())
}

/// Add the tags one chunk member contributes to its summary. Narrower than
/// [`derive_tags`]: only cpu and memory title rules apply here.
pub fn extend_summary_tags(alert: &AlertItem, tags: &mut BTreeSet<String>) {
    if alert.is_noisy {
        tags.insert(TAG_NOISY.to_string());
    }
    if alert.is_self_resolved {
        tags.insert(TAG_SELF_RESOLVED.to_string());
    }
    if let Some(component) = alert.node_analysis.component() {
        tags.insert(component_tag(component));
    }
    apply_title_rules(&alert.title, SUMMARY_TITLE_RULES, tags);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn alert(title: &str) -> AlertItem {
        AlertItem::new("id", title, "open", Utc::now())
    }

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_database_alert_with_component() {
        let a = alert("Database Connection Failed").with_component("db-01");
        let tags = derive_tags(&a);
        assert_eq!(tags, set(&["component:db-01", "type:database"]));
        assert_eq!(primary_tag(&tags), "component:db-01");
    }

    #[test]
    fn test_general_only_when_nothing_matches() {
        let tags = derive_tags(&alert("Application Error Rate Spike"));
        assert_eq!(tags, set(&[TAG_GENERAL]));

        let tags = derive_tags(&alert("Disk Space Low"));
        assert!(!tags.contains(TAG_GENERAL));
    }

    #[test]
    fn test_title_match_is_case_insensitive() {
        let tags = derive_tags(&alert("high cpu and memory pressure"));
        assert_eq!(tags, set(&[TAG_CPU, TAG_MEMORY]));
    }

    #[test]
    fn test_latency_maps_to_network() {
        assert_eq!(derive_tags(&alert("API Latency Spikes Detected")), set(&["type:network"]));
        assert_eq!(
            derive_tags(&alert("Network Latency Detected")),
            set(&["type:network"])
        );
    }

    #[test]
    fn test_flags_produce_status_tags() {
        let mut a = alert("Security Scan Alert");
        a.is_noisy = true;
        a.is_self_resolved = true;
        let tags = derive_tags(&a);
        assert_eq!(tags, set(&[TAG_NOISY, TAG_SELF_RESOLVED, "type:security"]));
        assert_eq!(primary_tag(&tags), TAG_NOISY);
    }

    #[test]
    fn test_empty_component_is_ignored() {
        let a = alert("Something Odd").with_component("");
        assert_eq!(derive_tags(&a), set(&[TAG_GENERAL]));
    }

    #[test]
    fn test_summary_tags_skip_wider_title_rules() {
        let mut tags = BTreeSet::new();
        extend_summary_tags(&alert("Disk Space Low"), &mut tags);
        extend_summary_tags(&alert("Memory Threshold Exceeded").with_component("api-gateway"), &mut tags);
        assert_eq!(tags, set(&["component:api-gateway", TAG_MEMORY]));
    }
}
