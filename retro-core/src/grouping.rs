//! Grouping and chunking of enriched alerts into retrospective summaries.
//!
//! Each alert is bucketed under its primary tag (the lexicographically
//! smallest tag it derives). Buckets are emitted in sorted key order and
//! split positionally into chunks of at most `max_alerts_per_summary`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::enrich::enrich_alert_items;
use crate::error::RetroError;
use crate::models::{AlertItem, RetrospectiveSummary, SummaryStats, TagCount};
use crate::resolution::SelfResolutionPolicy;
use crate::tags::{derive_tags, extend_summary_tags, primary_tag};

pub const DEFAULT_MAX_ALERTS_PER_SUMMARY: usize = 10;

/// Bucket alerts by primary tag. Encounter order is kept inside a bucket.
pub fn bucket_by_primary_tag(alerts: Vec<AlertItem>) -> BTreeMap<String, Vec<AlertItem>> {
    let mut buckets: BTreeMap<String, Vec<AlertItem>> = BTreeMap::new();
    for alert in alerts {
        let primary = primary_tag(&derive_tags(&alert));
        buckets.entry(primary).or_default().push(alert);
    }
    buckets
}

pub fn group_alerts_into_summaries(
    alerts: Vec<AlertItem>,
    max_alerts_per_summary: usize,
) -> Result<Vec<RetrospectiveSummary>, RetroError> {
    if max_alerts_per_summary == 0 {
        return Err(RetroError::invalid("max_alerts_per_summary must be positive"));
    }

    let mut summaries = Vec::new();
    for (primary, bucket) in bucket_by_primary_tag(alerts) {
        for chunk in bucket.chunks(max_alerts_per_summary) {
            let mut tags = BTreeSet::new();
            for alert in chunk {
                extend_summary_tags(alert, &mut tags);
                tags.insert(primary.clone());
            }
            if tags.is_empty() {
                tags.insert(primary.clone());
            }
            summaries.push(RetrospectiveSummary::new(tags, chunk.to_vec()));
        }
    }

    tracing::debug!(summaries = summaries.len(), "Grouped alerts into summaries");
    Ok(summaries)
}

/// Enrich then group in one call. Both limits are checked before any work.
pub fn alert_pipeline(
    alerts: Vec<AlertItem>,
    noisy_threshold_count: usize,
    max_alerts_per_summary: usize,
    policy: &mut dyn SelfResolutionPolicy,
) -> Result<Vec<RetrospectiveSummary>, RetroError> {
    if max_alerts_per_summary == 0 {
        return Err(RetroError::invalid("max_alerts_per_summary must be positive"));
    }
    let enriched = enrich_alert_items(alerts, noisy_threshold_count, policy)?;
    group_alerts_into_summaries(enriched, max_alerts_per_summary)
}

/// Tag counts (alerts per summary tag) and flag totals across summaries.
pub fn summary_stats(summaries: &[RetrospectiveSummary]) -> SummaryStats {
    let mut per_tag: HashMap<&str, usize> = HashMap::new();
    let mut stats = SummaryStats {
        summary_count: summaries.len(),
        ..Default::default()
    };

    for summary in summaries {
        stats.alert_count += summary.items.len();
        stats.noisy_count += summary.items.iter().filter(|a| a.is_noisy).count();
        stats.self_resolved_count += summary.items.iter().filter(|a| a.is_self_resolved).count();
        for tag in &summary.tags {
            *per_tag.entry(tag.as_str()).or_insert(0) += summary.items.len();
        }
    }

    let mut top_tags: Vec<TagCount> = per_tag
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    top_tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    stats.top_tags = top_tags;
    stats
}
