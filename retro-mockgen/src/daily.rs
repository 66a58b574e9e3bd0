//! Mock daily-summary items and tag-filtered retrospectives for UI demos.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::alerts::uuid_from;

const TITLES: &[&str] = &[
    "High CPU Usage on Payment Gateway",
    "Database Replication Lag Exceeds Threshold",
    "API Latency Spikes Detected",
    "Failed Login Attempts Surge",
    "Disk Space Critical on Logging Server",
    "Network Connectivity Issues in EU-WEST-1",
    "Order Processing Service Unresponsive",
    "SSL Certificate Expiring Soon for *.example.com",
    "Data Synchronization Job Failed",
    "Kubernetes Pod CrashLoopBackOff in Prod",
];

const DESCRIPTIONS: &[&str] = &[
    "CPU utilization on server X has been above 90% for the last 15 minutes.",
    "Replication lag between primary and replica DB Y is currently 30 minutes.",
    "P99 latency for /api/v1/users endpoint increased by 200ms.",
    "Observed over 1000 failed login attempts from IP Z in the last hour.",
    "Disk usage on /var/log on server A is at 98%.",
    "Packet loss detected for traffic to and from the EU-WEST-1 region.",
    "The order processing service is not responding to health checks.",
    "The SSL certificate for our main domain expires in 7 days.",
    "Nightly data sync job from CRM to DWH failed with error code 500.",
    "The user-service pod in the production K8s cluster is restarting continuously.",
];

const GRAPH_ANALYSIS: &[&str] = &[
    "Graph analysis indicates a potential bottleneck in the upstream service 'AuthService'.",
    "Graph points to 'DatabaseConnector' module as the root cause of timeouts.",
    "Affected area seems localized to 'CheckoutFlow', impacting 'PaymentService' and 'InventoryService'.",
    "Analysis suggests an external dependency 'GeoIPLookup' is failing.",
    "The issue appears to be cascading from 'MessageQueue' being full.",
];

const NODE_GROUPS: &[&[&str]] = &[
    &["payment-gateway-prod-01", "payment-gateway-prod-02"],
    &["db-primary-pg15", "db-replica-pg15-eu"],
    &["api-gw-instance-001", "api-gw-instance-002", "api-gw-instance-003"],
    &["auth-service-pod-xyz", "user-db"],
    &["log-server-01", "log-aggregator-service"],
    &["vpc-eu-west-1-nat-gw", "firewall-eu-west-1"],
    &["order-processor-svc", "downstream-fulfillment-svc"],
    &["loadbalancer-prod", "cdn-wildcard-ssl"],
    &["etl-job-runner-01", "crm-connector", "dwh-staging-db"],
    &["k8s-node-prod-05", "user-service-deployment"],
];

const GENERIC_NODES: &[&str] = &["generic-node-1", "generic-node-2"];

pub const MOCK_TAGS: &[&str] = &[
    "HighCPU",
    "Database",
    "Latency",
    "Security",
    "DiskSpace",
    "Network",
    "ServiceDown",
    "Certificate",
    "ETL",
    "Kubernetes",
    "Performance",
    "Critical",
    "CustomerImpact",
    "Infra",
    "Autoscaling",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyItem {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub title: String,
    pub description: String,
    pub graph_analysis: String,
    pub nodes_affected: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub items: Vec<DailyItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRetrospective {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tags: Vec<String>,
    pub insights: String,
    pub related_daily_summary_ids: Vec<String>,
}

fn pick<'a>(rng: &mut impl Rng, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

/// One item stamped within the last 24 hours of `now`.
pub fn generate_daily_item(rng: &mut impl Rng, now: DateTime<Utc>) -> DailyItem {
    let timestamp = (now - Duration::minutes(rng.gen_range(0..=1440))).naive_utc();

    let mut pool: Vec<&str> = NODE_GROUPS.choose(rng).map(|g| g.to_vec()).unwrap_or_default();
    pool.extend_from_slice(GENERIC_NODES);
    let take = rng.gen_range(1..=3).min(pool.len());
    let nodes_affected = pool
        .choose_multiple(rng, take)
        .map(|n| n.to_string())
        .collect();

    let tag_count = rng.gen_range(2..=5);
    let tags = MOCK_TAGS
        .iter()
        .choose_multiple(rng, tag_count)
        .into_iter()
        .map(|t| t.to_string())
        .collect();

    DailyItem {
        id: uuid_from(rng).to_string(),
        timestamp,
        title: pick(rng, TITLES).to_string(),
        description: pick(rng, DESCRIPTIONS).to_string(),
        graph_analysis: pick(rng, GRAPH_ANALYSIS).to_string(),
        nodes_affected,
        tags,
    }
}

/// A day of `num_items` items, each re-stamped within `date`.
pub fn generate_daily_summary(rng: &mut impl Rng, date: NaiveDate, num_items: usize) -> DailySummary {
    let now = Utc::now();
    let base = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let items = (0..num_items)
        .map(|_| {
            let mut item = generate_daily_item(rng, now);
            item.timestamp = base
                + Duration::hours(rng.gen_range(0..=23))
                + Duration::minutes(rng.gen_range(0..=59));
            item
        })
        .collect();
    DailySummary { date, items }
}

/// Collect items carrying any of `target_tags` and describe them.
///
/// Every supplied day counts as related; callers filter by date first.
pub fn generate_tag_retrospective(
    rng: &mut impl Rng,
    days: &[DailySummary],
    target_tags: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> TagRetrospective {
    let related_daily_summary_ids: Vec<String> = days.iter().map(|d| d.date.to_string()).collect();
    let relevant: Vec<&DailyItem> = days
        .iter()
        .flat_map(|d| d.items.iter())
        .filter(|item| item.tags.iter().any(|t| target_tags.contains(t)))
        .collect();

    let mut insights = format!("Retrospective analysis for tags: {}. ", target_tags.join(", "));
    if relevant.is_empty() {
        insights.push_str(&format!(
            "No relevant items found for these tags between {} and {}.",
            start, end
        ));
    } else {
        insights.push_str(&format!(
            "Found {} relevant items between {} and {}. Key observations include: ",
            relevant.len(),
            start,
            end
        ));

        let nodes: BTreeSet<&str> = relevant
            .iter()
            .take(3)
            .flat_map(|item| item.nodes_affected.iter().map(String::as_str))
            .collect();
        if !nodes.is_empty() {
            let shown: Vec<&str> = nodes.into_iter().take(3).collect();
            insights.push_str(&format!(
                "Frequently affected nodes/services: {}. ",
                shown.join(", ")
            ));
        }

        let themes: BTreeSet<&str> = relevant
            .iter()
            .filter_map(|item| item.title.split(' ').next())
            .collect();
        let shown: Vec<&str> = themes.into_iter().take(2).collect();
        insights.push_str(&format!("Common themes: {}.", shown.join(", ")));
    }

    TagRetrospective {
        id: uuid_from(rng).to_string(),
        start_date: start,
        end_date: end,
        tags: target_tags.to_vec(),
        insights,
        related_daily_summary_ids,
    }
}
