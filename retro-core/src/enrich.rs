//! Enrichment stage: derives `is_noisy` and `is_self_resolved` for a batch
//! of alerts.

use std::collections::HashMap;

use crate::error::RetroError;
use crate::models::AlertItem;
use crate::resolution::SelfResolutionPolicy;

pub const DEFAULT_NOISY_THRESHOLD: usize = 3;

/// Sort alerts by `created_date` (stable) and set the enrichment flags.
///
/// An alert is noisy once its exact title has been seen
/// `noisy_threshold_count` times in sorted order, counting itself. Closed
/// alerts are offered to `policy` for self-resolution. Flags are only ever
/// set to `true`; values already set on input are kept.
pub fn enrich_alert_items(
    mut alerts: Vec<AlertItem>,
    noisy_threshold_count: usize,
    policy: &mut dyn SelfResolutionPolicy,
) -> Result<Vec<AlertItem>, RetroError> {
    if noisy_threshold_count == 0 {
        return Err(RetroError::invalid("noisy_threshold_count must be positive"));
    }

    alerts.sort_by_key(|a| a.created_date);

    let mut title_counts: HashMap<String, usize> = HashMap::new();
    for alert in alerts.iter_mut() {
        let seen = title_counts.entry(alert.title.clone()).or_insert(0);
        *seen += 1;
        if *seen >= noisy_threshold_count {
            alert.is_noisy = true;
        }

        if alert.status.is_closed() && policy.qualifies(alert) {
            alert.is_self_resolved = true;
        }
    }

    tracing::debug!(
        alerts = alerts.len(),
        distinct_titles = title_counts.len(),
        noisy = alerts.iter().filter(|a| a.is_noisy).count(),
        self_resolved = alerts.iter().filter(|a| a.is_self_resolved).count(),
        policy = policy.name(),
        "Enriched alert batch"
    );

    Ok(alerts)
}
