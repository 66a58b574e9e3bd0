//! Alert enrichment and grouping for caller-supplied and generated alerts.

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use retro_core::config::{AlertsConfig, SelfResolutionKind};
use retro_core::models::SummaryStats;
use retro_core::{
    alert_pipeline, policy_from_config, positive_count, summary_stats, AlertItem, RetroError,
    RetrospectiveSummary,
};
use retro_mockgen::{generate_alerts, generate_daily_summary, AlertOptions, DailySummary};

use crate::context::AppContext;

const DEFAULT_DAILY_ITEMS: usize = 5;

/// Per-request overrides. Counts arrive signed so that zero and negative
/// values can be rejected rather than silently wrapped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupingParams {
    pub noisy_threshold_count: Option<i64>,
    pub max_alerts_per_summary: Option<i64>,
    /// Switches to the resolution-window policy with this many minutes.
    pub self_resolved_minutes: Option<i64>,
    pub seed: Option<u64>,
}

impl GroupingParams {
    /// Overlay the overrides on `defaults`, validating each one.
    pub fn resolve(&self, defaults: &AlertsConfig) -> Result<AlertsConfig, RetroError> {
        let mut config = defaults.clone();
        if let Some(n) = self.noisy_threshold_count {
            config.noisy_threshold_count = positive_count("noisy_threshold_count", n)?;
        }
        if let Some(n) = self.max_alerts_per_summary {
            config.max_alerts_per_summary = positive_count("max_alerts_per_summary", n)?;
        }
        if let Some(m) = self.self_resolved_minutes {
            config.self_resolved_minutes = positive_count("self_resolved_minutes", m)? as u64;
            config.self_resolution = SelfResolutionKind::Window;
        }
        Ok(config)
    }
}

/// Seed for the self-resolution policy, kept off the generator's stream.
fn policy_seed(seed: Option<u64>) -> Option<u64> {
    seed.map(|s| s.wrapping_add(1))
}

/// A positive count no larger than `max`.
fn capped_count(name: &str, value: i64, max: usize) -> Result<usize, RetroError> {
    let n = positive_count(name, value)?;
    if n > max {
        return Err(RetroError::invalid(format!(
            "{} must be at most {}, got {}",
            name, max, n
        )));
    }
    Ok(n)
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupedAlerts {
    pub summaries: Vec<RetrospectiveSummary>,
    pub stats: SummaryStats,
}

fn run_pipeline(
    alerts: Vec<AlertItem>,
    config: &AlertsConfig,
    seed: Option<u64>,
) -> Result<GroupedAlerts, RetroError> {
    let mut policy = policy_from_config(config, seed)?;
    let summaries = alert_pipeline(
        alerts,
        config.noisy_threshold_count,
        config.max_alerts_per_summary,
        &mut *policy,
    )?;
    let stats = summary_stats(&summaries);
    tracing::info!(
        summaries = stats.summary_count,
        alerts = stats.alert_count,
        noisy = stats.noisy_count,
        self_resolved = stats.self_resolved_count,
        policy = policy.name(),
        "Alerts grouped"
    );
    Ok(GroupedAlerts { summaries, stats })
}

/// Enrich and group alerts supplied by the caller.
pub fn group_alerts(
    ctx: &AppContext,
    alerts: Vec<AlertItem>,
    params: &GroupingParams,
) -> Result<GroupedAlerts, RetroError> {
    let config = params.resolve(&ctx.config.alerts)?;
    run_pipeline(alerts, &config, params.seed)
}

/// Generate `count` mock alerts (config default when absent), then group them.
pub fn mock_summaries(
    ctx: &AppContext,
    count: Option<i64>,
    params: &GroupingParams,
) -> Result<GroupedAlerts, RetroError> {
    let config = params.resolve(&ctx.config.alerts)?;
    let count = match count {
        Some(n) => capped_count("count", n, config.max_mock_alert_count)?,
        None => config.mock_alert_count,
    };

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let options = AlertOptions {
        with_resolution: matches!(config.self_resolution, SelfResolutionKind::Window),
    };
    let alerts = generate_alerts(&mut rng, count, Utc::now(), options);
    run_pipeline(alerts, &config, policy_seed(params.seed))
}

/// One mock day of daily-summary items.
pub fn mock_daily(
    ctx: &AppContext,
    date: Option<NaiveDate>,
    items: Option<i64>,
    seed: Option<u64>,
) -> Result<DailySummary, RetroError> {
    let items = match items {
        Some(n) => capped_count("items", n, ctx.config.alerts.max_mock_daily_items)?,
        None => DEFAULT_DAILY_ITEMS,
    };
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok(generate_daily_summary(&mut rng, date, items))
}
