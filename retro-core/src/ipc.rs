use serde::{Deserialize, Serialize};

use crate::models::{AlertItem, RetrospectiveSummary};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RetroRequest {
    Ping,
    Health,
    SubmitDaily {
        text: String,
        thread_id: Option<String>,
    },
    Retrospective {
        thread_id: Option<String>,
    },
    Insights {
        summary: RetrospectiveSummary,
        thread_id: Option<String>,
    },
    GroupAlerts {
        alerts: Vec<AlertItem>,
        noisy_threshold_count: Option<i64>,
        max_alerts_per_summary: Option<i64>,
        self_resolved_minutes: Option<i64>,
        seed: Option<u64>,
    },
    MockSummaries {
        count: Option<i64>,
        seed: Option<u64>,
        noisy_threshold_count: Option<i64>,
        max_alerts_per_summary: Option<i64>,
        self_resolved_minutes: Option<i64>,
    },
    MockDaily {
        date: Option<chrono::NaiveDate>,
        items: Option<i64>,
        seed: Option<u64>,
    },
}

/// `kind` distinguishes bad input from an unavailable LLM and internal
/// failures so outer surfaces can pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    Unavailable,
    Internal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetroResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub version: String,
}

impl RetroResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            error_kind: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self::err_kind(ErrorKind::Internal, msg)
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::err_kind(ErrorKind::InvalidArgument, msg)
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::err_kind(ErrorKind::Unavailable, msg)
    }

    fn err_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            error_kind: Some(kind),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_action_tagged() {
        let req: RetroRequest = serde_json::from_value(serde_json::json!({
            "action": "submit_daily",
            "text": "Day 1",
            "thread_id": null
        }))
        .unwrap();
        assert!(matches!(req, RetroRequest::SubmitDaily { ref text, .. } if text == "Day 1"));
    }

    #[test]
    fn test_optional_fields_may_be_omitted() {
        let req: RetroRequest =
            serde_json::from_value(serde_json::json!({"action": "mock_summaries", "count": 5}))
                .unwrap();
        match req {
            RetroRequest::MockSummaries { count, seed, self_resolved_minutes, .. } => {
                assert_eq!(count, Some(5));
                assert!(seed.is_none() && self_resolved_minutes.is_none());
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_error_response_carries_kind() {
        let resp = RetroResponse::invalid("bad");
        assert!(!resp.is_ok());
        assert_eq!(resp.error_kind, Some(ErrorKind::InvalidArgument));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["error_kind"], "invalid_argument");

        let ok = serde_json::to_value(RetroResponse::pong()).unwrap();
        assert!(ok.get("error_kind").is_none());
    }
}
