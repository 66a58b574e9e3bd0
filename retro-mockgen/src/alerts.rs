//! Mock alert generation.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use retro_core::models::{AlertItem, AlertStatus, GraphAnalysis, NodeAnalysis};

pub const ALERT_TITLES: &[&str] = &[
    "CPU Usage High",
    "Memory Threshold Exceeded",
    "Disk Space Low",
    "Network Latency Detected",
    "Application Error Rate Spike",
    "Database Connection Failed",
    "Security Scan Alert",
];

const STATUSES: &[&str] = &["open", "closed", "acknowledged"];
const COMPONENTS: &[&str] = &["server-prod-01", "db-primary", "api-gateway", "user-service"];
const METRICS: &[&str] = &["CPUUtilization", "MemoryUsage", "DiskReadOps", "Latency"];
const IMPACT_RADII: &[&str] = &["small", "medium", "large"];

#[derive(Debug, Clone, Copy, Default)]
pub struct AlertOptions {
    /// Give closed alerts a `resolved_date` 1–60 minutes after creation.
    pub with_resolution: bool,
}

/// Random UUID drawn from `rng`, so seeded runs reproduce ids too.
pub fn uuid_from(rng: &mut impl Rng) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

fn pick<'a>(rng: &mut impl Rng, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

pub fn generate_alert(rng: &mut impl Rng, now: DateTime<Utc>, options: AlertOptions) -> AlertItem {
    let id = uuid_from(rng).to_string();
    let title = pick(rng, ALERT_TITLES);
    let status = AlertStatus::from(pick(rng, STATUSES));
    let created_date =
        now - Duration::days(rng.gen_range(0..=7)) - Duration::hours(rng.gen_range(0..=23));

    let value: f64 = rng.gen_range(50.0..100.0);
    let node_analysis = NodeAnalysis {
        component: Some(pick(rng, COMPONENTS).to_string()),
        metric: Some(pick(rng, METRICS).to_string()),
        value: Some((value * 100.0).round() / 100.0),
        extra: Default::default(),
    };

    let correlated = rng.gen_range(0..=3);
    let graph_analysis = GraphAnalysis {
        correlated_alerts: (0..correlated).map(|_| uuid_from(rng).to_string()).collect(),
        impact_radius: Some(pick(rng, IMPACT_RADII).to_string()),
        extra: Default::default(),
    };

    let resolved_date = if options.with_resolution && status.is_closed() {
        Some(created_date + Duration::minutes(rng.gen_range(1..=60)))
    } else {
        None
    };

    AlertItem {
        id,
        title: title.to_string(),
        status,
        created_date,
        resolved_date,
        node_analysis,
        graph_analysis,
        is_noisy: false,
        is_self_resolved: false,
    }
}

pub fn generate_alerts(
    rng: &mut impl Rng,
    count: usize,
    now: DateTime<Utc>,
    options: AlertOptions,
) -> Vec<AlertItem> {
    (0..count).map(|_| generate_alert(rng, now, options)).collect()
}
