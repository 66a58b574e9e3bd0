use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an alert. Values outside the known set are carried
/// through verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertStatus {
    Open,
    Closed,
    Acknowledged,
    Other(String),
}

impl AlertStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Acknowledged => "acknowledged",
            Self::Other(s) => s,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl From<String> for AlertStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "acknowledged" => Self::Acknowledged,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for AlertStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<AlertStatus> for String {
    fn from(status: AlertStatus) -> Self {
        match status {
            AlertStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node-level analysis attached to an alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Unknown keys, kept for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NodeAnalysis {
    /// The component name, if present and non-empty.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.component.is_none()
            && self.metric.is_none()
            && self.value.is_none()
            && self.extra.is_empty()
    }
}

/// Graph-level analysis attached to an alert. Never interpreted by the
/// enrichment or grouping stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphAnalysis {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correlated_alerts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_radius: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GraphAnalysis {
    pub fn is_empty(&self) -> bool {
        self.correlated_alerts.is_empty() && self.impact_radius.is_none() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertItem {
    pub id: String,
    pub title: String,
    pub status: AlertStatus,
    pub created_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_date: Option<DateTime<Utc>>,
    #[serde(rename = "alert_node_analysis", alias = "node_analysis", default)]
    pub node_analysis: NodeAnalysis,
    #[serde(default)]
    pub graph_analysis: GraphAnalysis,
    #[serde(default)]
    pub is_noisy: bool,
    #[serde(default)]
    pub is_self_resolved: bool,
}

impl AlertItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        status: impl Into<AlertStatus>,
        created_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: status.into(),
            created_date,
            resolved_date: None,
            node_analysis: NodeAnalysis::default(),
            graph_analysis: GraphAnalysis::default(),
            is_noisy: false,
            is_self_resolved: false,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.node_analysis.component = Some(component.into());
        self
    }

    pub fn with_resolved_date(mut self, resolved: DateTime<Utc>) -> Self {
        self.resolved_date = Some(resolved);
        self
    }
}

impl fmt::Display for AlertItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alert(id='{}', title='{}', status='{}', created='{}', noisy={}, self_resolved={})",
            self.id,
            self.title,
            self.status,
            self.created_date.to_rfc3339(),
            self.is_noisy,
            self.is_self_resolved
        )
    }
}
