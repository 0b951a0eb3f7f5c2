//! Outbound boundary to the move-generation service
//!
//! One call per attempt: directive text in, raw free text out. Everything
//! behind [`MoveGenerator`] is untrusted; any failure here (missing
//! credential, transport, bad wire shape) makes the controller fall back
//! immediately — the engine never retries the transport itself, only the
//! "ask for a different move" kind of retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors from one generation attempt
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// No API key configured
    #[error("API key is missing")]
    MissingApiKey,

    /// The HTTP call itself failed
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("service error {status}: {body}")]
    Service { status: u16, body: String },

    /// The response body did not contain a text candidate
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// The external move-generation service, reduced to one call
#[async_trait]
pub trait MoveGenerator: Send + Sync {
    /// Send one directive, receive the raw reply text
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Configuration for [`GeminiClient`]
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; `None` degrades every attempt to the fallback path
    pub api_key: Option<String>,
    /// Model name, e.g. `gemini-1.5-flash`
    pub model: String,
    /// API base URL, overridable for tests and proxies
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl GeminiConfig {
    /// Read `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_BASE_URL` from the
    /// environment, defaulting the latter two
    pub fn from_env() -> Self {
        let defaults = GeminiConfig::default();
        GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
        }
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        GeminiClient {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(GeminiConfig::from_env())
    }
}

#[async_trait]
impl MoveGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerateError::MissingApiKey)?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, api_key
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::Service {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                GenerateError::MalformedResponse("no text candidate in response".to_string())
            })?;

        debug!("[GEMINI] raw reply: {text:?}");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_fails_before_any_io() {
        let client = GeminiClient::new(GeminiConfig::default());
        let err = client.generate("irrelevant").await.unwrap_err();
        assert!(matches!(err, GenerateError::MissingApiKey));
    }

    #[test]
    fn test_response_wire_shape_parses() {
        let body = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "1. e4" } ] } }
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text, "1. e4");
    }

    #[test]
    fn test_empty_candidates_parse_to_empty_vec() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
