//! Text generation backend
//!
//! Provides a `TextGenerator` trait and the Gemini `generateContent`
//! implementation used in production. Each `generate` call is exactly one HTTP
//! request: there is no retry and no backoff, so callers see upstream failures
//! immediately. The only time bound is the HTTP client timeout.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::GeminiConfig;

/// Default Gemini REST endpoint
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request header carrying the API key. The key never appears in a request URL.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

// ============================================================================
// TextGenerator trait
// ============================================================================

/// Abstraction over text-completion providers.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`. Empty or absent text is `GenerationError::EmptyResponse`.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Empty response from Gemini API")]
    EmptyResponse,

    #[error("GEMINI_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
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

impl GenerateResponse {
    /// Concatenated text parts of the first candidate, if any.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        Some(text)
    }
}

// ============================================================================
// GeminiTextClient
// ============================================================================

/// Gemini text client — calls `models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiTextClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiTextClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, GenerationError> {
        Self::with_base_url(config, GEMINI_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(config: &GeminiConfig, base_url: String) -> Result<Self, GenerationError> {
        let api_key = config.resolved_api_key();
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiTextClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request = GenerateRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, model = %self.model, "Gemini API error");

            return Err(GenerationError::Api { code, message });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;

        match body.into_text() {
            Some(text) if !text.is_empty() => Ok(text),
            _ => {
                tracing::warn!(model = %self.model, "Gemini returned no text");
                Err(GenerationError::EmptyResponse)
            }
        }
    }

    fn name(&self) -> &str {
        "gemini"
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

    fn test_config(api_key: &str) -> GeminiConfig {
        GeminiConfig {
            model: "gemini-1.5-pro".to_string(),
            api_key: Some(api_key.to_string()),
            timeout_seconds: 5,
        }
    }

    fn text_response(parts: &[&str]) -> serde_json::Value {
        let parts: Vec<serde_json::Value> =
            parts.iter().map(|t| serde_json::json!({ "text": t })).collect();
        serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": parts } }]
        })
    }

    #[tokio::test]
    async fn test_generate_posts_prompt_and_returns_text() {
        let mock_server = MockServer::start().await;
        let client = GeminiTextClient::with_base_url(&test_config("test-api-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .and(header(API_KEY_HEADER, "test-api-key"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "contents": [{ "parts": [{ "text": "write a haiku" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&["old pond"])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.generate("write a haiku").await;

        assert_eq!(result.expect("generate"), "old pond");
    }

    #[tokio::test]
    async fn test_generate_joins_multiple_parts() {
        let mock_server = MockServer::start().await;
        let client =
            GeminiTextClient::with_base_url(&test_config("k"), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(text_response(&["#one\n", "#two"])),
            )
            .mount(&mock_server)
            .await;

        assert_eq!(client.generate("x").await.unwrap(), "#one\n#two");
    }

    #[tokio::test]
    async fn test_api_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        let client =
            GeminiTextClient::with_base_url(&test_config("k"), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "code": 429, "message": "Resource has been exhausted" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        match client.generate("x").await {
            Err(GenerationError::Api { code, message }) => {
                assert_eq!(code, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_error_without_envelope_uses_status_and_body() {
        let mock_server = MockServer::start().await;
        let client =
            GeminiTextClient::with_base_url(&test_config("k"), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&mock_server)
            .await;

        match client.generate("x").await {
            Err(GenerationError::Api { code, message }) => {
                assert_eq!(code, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_response() {
        let mock_server = MockServer::start().await;
        let client =
            GeminiTextClient::with_base_url(&test_config("k"), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [],
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&mock_server)
            .await;

        assert!(matches!(
            client.generate("x").await,
            Err(GenerationError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_empty_text_is_empty_response() {
        let mock_server = MockServer::start().await;
        let client =
            GeminiTextClient::with_base_url(&test_config("k"), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&[""])))
            .mount(&mock_server)
            .await;

        assert!(matches!(
            client.generate("x").await,
            Err(GenerationError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_api_key_is_sent_as_header_not_in_url() {
        let mock_server = MockServer::start().await;
        let client =
            GeminiTextClient::with_base_url(&test_config("SECRET-KEY-123"), mock_server.uri())
                .unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&["ok"])))
            .mount(&mock_server)
            .await;

        client.generate("x").await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.query().is_none());
        assert!(!requests[0].url.as_str().contains("SECRET-KEY-123"));
        assert_eq!(
            requests[0].headers.get(API_KEY_HEADER).map(|v| v.as_bytes()),
            Some("SECRET-KEY-123".as_bytes())
        );
    }

    #[tokio::test]
    async fn test_connection_error_text_omits_key_and_url() {
        // Nothing listens on port 1.
        let client = GeminiTextClient::with_base_url(
            &test_config("SECRET-KEY-123"),
            "http://127.0.0.1:1".to_string(),
        )
        .unwrap();

        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::Http(_)));

        let wrapped = crate::StudioError::task("generate script", err);
        let shown = wrapped.to_string();
        let debug = format!("{:?}", wrapped);
        assert!(!shown.contains("SECRET-KEY-123"), "{}", shown);
        assert!(!debug.contains("SECRET-KEY-123"), "{}", debug);
        assert!(!shown.contains("generateContent"), "{}", shown);
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        if std::env::var(crate::config::GEMINI_API_KEY_ENV).is_ok() {
            eprintln!("Skipping test_blank_api_key_is_rejected: GEMINI_API_KEY is set");
            return;
        }

        let result = GeminiTextClient::new(&test_config("  "));

        assert!(matches!(result, Err(GenerationError::MissingApiKey)));
    }

    #[test]
    fn test_client_reports_name_and_model() {
        let client = GeminiTextClient::new(&test_config("k")).unwrap();
        assert_eq!(client.name(), "gemini");
        assert_eq!(client.model(), "gemini-1.5-pro");
    }
}
