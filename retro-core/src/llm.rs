//! LLM client for retrospective and insight text.
//!
//! Provides a `Summarizer` trait with implementations for:
//! - **Gemini**: `generateContent` over HTTP with retry and backoff
//! - **Disabled**: always fails, so callers report the summary as unavailable

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::config::LlmConfig;

// ============================================================================
// Summarizer trait
// ============================================================================

/// Send prompt text, receive generated text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String, LlmError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Missing API key")]
    MissingApiKey,

    #[error("LLM backend is disabled")]
    Disabled,

    #[error("All {attempts} retry attempts failed: {last}")]
    RetryExhausted { attempts: usize, last: String },
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs never reach error text, whatever they carry.
        LlmError::Http(e.without_url())
    }
}

impl LlmError {
    /// Transport failures, rate limits and server errors are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::EmptyResponse => true,
            LlmError::Api { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: u16,
    message: String,
}

// ============================================================================
// GeminiClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: usize,
    retry_delay_ms: u64,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::with_base_url(config, config.base_url.clone())
    }

    /// Create a client against a custom base URL (tests, proxies).
    pub fn with_base_url(config: &LlmConfig, base_url: String) -> Result<Self, LlmError> {
        let api_key = config.resolved_api_key().ok_or(LlmError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request = GenerateRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let (code, message) = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Gemini API error");
            return Err(LlmError::Api { code, message });
        }

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, prompt: &str) -> Result<String, LlmError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.retry_delay_ms.max(1))
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.max_retries);

        let result = RetryIf::start(
            retry_strategy,
            || self.generate_once(prompt),
            LlmError::is_retryable,
        )
        .await;

        match result {
            Ok(text) => Ok(text),
            Err(e) if !e.is_retryable() => Err(e),
            Err(e) => {
                tracing::error!(
                    attempts = self.max_retries + 1,
                    error = %e,
                    "All generation attempts failed"
                );
                Err(LlmError::RetryExhausted {
                    attempts: self.max_retries + 1,
                    last: e.to_string(),
                })
            }
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// DisabledSummarizer
// ============================================================================

/// Stand-in used when no LLM is configured.
#[derive(Debug, Clone, Default)]
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Disabled)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Build the configured summarizer. A missing key degrades to
/// [`DisabledSummarizer`] with a warning rather than failing startup.
pub fn create_summarizer(config: &LlmConfig) -> Box<dyn Summarizer> {
    if !config.enabled {
        tracing::info!("LLM disabled by config");
        return Box::new(DisabledSummarizer);
    }
    match GeminiClient::new(config) {
        Ok(client) => Box::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "LLM unavailable, summaries will be reported as unavailable");
            Box::new(DisabledSummarizer)
        }
    }
}

/// Unwrap a fenced ```json block, if the model wrapped its answer in one.
pub fn strip_json_fence(text: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```(\w*)?\s*\n?(.*?)\n?\s*```$").expect("fence regex is valid")
    });

    let trimmed = text.trim();
    match fence.captures(trimmed).and_then(|c| c.get(2)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_key: &str) -> LlmConfig {
        LlmConfig {
            enabled: true,
            model: "gemini-pro".to_string(),
            api_key: Some(api_key.to_string()),
            base_url: "http://unused".to_string(),
            timeout_seconds: 5,
            max_retries: 2,
            retry_delay_ms: 10,
        }
    }

    fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": text }], "role": "model" } }
            ]
        })
    }

    #[tokio::test]
    async fn test_summarize_posts_prompt_and_returns_text() {
        let mock_server = MockServer::start().await;
        let client = GeminiClient::with_base_url(&test_config("test-key"), mock_server.uri())
            .expect("client");

        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(serde_json::json!({
                "contents": [{ "parts": [{ "text": "summarize this" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("A calm week.")))
            .mount(&mock_server)
            .await;

        let text = client.summarize("summarize this").await.unwrap();
        assert_eq!(text, "A calm week.");
    }

    #[tokio::test]
    async fn test_summarize_retries_after_429() {
        let mock_server = MockServer::start().await;
        let client =
            GeminiClient::with_base_url(&test_config("test-key"), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "code": 429, "message": "Rate limit exceeded" }
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("ok")))
            .mount(&mock_server)
            .await;

        assert_eq!(client.summarize("p").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_summarize_exhausts_retries_on_500() {
        let mock_server = MockServer::start().await;
        let client =
            GeminiClient::with_base_url(&test_config("test-key"), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "code": 500, "message": "boom" }
            })))
            .mount(&mock_server)
            .await;

        match client.summarize("p").await {
            Err(LlmError::RetryExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(last.contains("boom"));
            }
            other => panic!("Expected RetryExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        let client =
            GeminiClient::with_base_url(&test_config("bad-key"), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "code": 400, "message": "API key not valid" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        match client.summarize("p").await {
            Err(LlmError::Api { code, message }) => {
                assert_eq!(code, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let mut config = test_config("SUPERSECRETKEY123");
        config.max_retries = 0;
        let client = GeminiClient::with_base_url(&config, "http://127.0.0.1:1".into()).unwrap();

        let err = client.summarize("p").await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("HTTP request failed"), "got: {}", text);
        assert!(!text.contains("SUPERSECRETKEY123"), "got: {}", text);
        assert!(!text.contains("127.0.0.1"), "got: {}", text);
    }

    #[test]
    fn test_retryable_errors() {
        let api = |code| LlmError::Api {
            code,
            message: String::new(),
        };
        assert!(api(429).is_retryable());
        assert!(api(503).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!api(403).is_retryable());
        assert!(!LlmError::Disabled.is_retryable());
        assert!(!LlmError::MissingApiKey.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let mock_server = MockServer::start().await;
        let mut config = test_config("test-key");
        config.max_retries = 0;
        let client = GeminiClient::with_base_url(&config, mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&mock_server)
            .await;

        let err = client.summarize("p").await.unwrap_err();
        assert!(err.to_string().contains("Empty response"), "got: {}", err);
    }

    #[test]
    fn test_missing_api_key() {
        let mut config = test_config("");
        config.api_key = Some("   ".to_string());
        if std::env::var("GEMINI_API_KEY").is_ok() {
            return;
        }
        assert!(matches!(
            GeminiClient::new(&config),
            Err(LlmError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_disabled_summarizer_fails() {
        let mut config = test_config("k");
        config.enabled = false;
        let summarizer = create_summarizer(&config);
        assert_eq!(summarizer.name(), "disabled");
        assert!(matches!(summarizer.summarize("x").await, Err(LlmError::Disabled)));
    }

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(strip_json_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_json_fence("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_json_fence("  plain text  "), "plain text");
    }
}
