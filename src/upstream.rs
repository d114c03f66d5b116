// Groq chat-completions client and outcome classification
//
// Errors are classified into a tagged variant immediately after the HTTP
// call so that downstream logic is variant matching, not status peeking.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::UpstreamConfig;

/// Model requested from the provider
pub const MODEL: &str = "llama-3.1-8b-instant";

/// System prompt sent with every completion request
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Provide accurate, helpful, and detailed responses to user questions. Be conversational and engaging.";

/// Sampling temperature for every request
pub const TEMPERATURE: f64 = 0.7;

/// Completion token cap for every request
pub const MAX_TOKENS: u32 = 500;

/// One message in the completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Request body for the OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub stream: bool,
}

impl CompletionRequest {
    /// Build the fixed-shape request for a single user turn
    pub fn for_user_content(user_content: String) -> Self {
        Self {
            model: MODEL.to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_content,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        }
    }
}

/// One completion choice in the provider response
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

/// Message content of a completion choice; content may be absent
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

/// Provider response body (only the fields the mediator reads)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// Upstream failure, classified by status at the call boundary
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP 401: the API key was rejected
    #[error("upstream rejected the API key")]
    Unauthorized,

    /// HTTP 429: quota or rate limit exceeded
    #[error("upstream rate limit exceeded")]
    RateLimited,

    /// Any other non-2xx response (including 400 and 5xx)
    #[error("upstream API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Connection, TLS, or timeout failure before a status was received
    #[error("upstream transport failure: {0}")]
    Transport(String),
}

/// Seam between the mediator and the concrete provider client, so tests can
/// substitute a scripted upstream.
#[async_trait]
pub trait UpstreamLlm: Send + Sync {
    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, UpstreamError>;
}

/// Production client for the Groq API
pub struct GroqClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl GroqClient {
    /// Build a client from the upstream configuration.
    ///
    /// Fails if the configuration carries no usable API key or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let api_key = match &config.api_key {
            Some(key) if config.has_api_key() => key.clone(),
            _ => return Err(UpstreamError::Unauthorized),
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl UpstreamLlm for GroqClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, UpstreamError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))
    }
}

/// Map a non-2xx status and error body to the tagged variant
pub fn classify_status(status: u16, body: String) -> UpstreamError {
    match status {
        401 => UpstreamError::Unauthorized,
        429 => UpstreamError::RateLimited,
        _ => {
            // Prefer the provider's machine-readable error message if present
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or(body);
            UpstreamError::Api { status, message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_401() {
        assert!(matches!(
            classify_status(401, String::new()),
            UpstreamError::Unauthorized
        ));
    }

    #[test]
    fn test_classify_429() {
        assert!(matches!(
            classify_status(429, String::new()),
            UpstreamError::RateLimited
        ));
    }

    #[test]
    fn test_classify_400_is_generic_api_error() {
        // 400 ("model might not be available") is deliberately not a
        // distinct category
        let err = classify_status(400, "bad request".to_string());
        assert!(matches!(err, UpstreamError::Api { status: 400, .. }));
    }

    #[test]
    fn test_classify_500_extracts_error_message() {
        let body = r#"{"error":{"message":"service unavailable","code":"internal"}}"#;
        match classify_status(503, body.to_string()) {
            UpstreamError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "service unavailable");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_completion_request_shape() {
        let request = CompletionRequest::for_user_content("ping".to_string());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], MODEL);
        assert_eq!(value["temperature"], 0.7);
        assert_eq!(value["max_tokens"], 500);
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "ping");
    }

    #[test]
    fn test_completion_response_tolerates_missing_choices() {
        let response: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(response.choices.is_empty());
    }

    #[test]
    fn test_groq_client_requires_key() {
        let config = UpstreamConfig::default();
        assert!(matches!(
            GroqClient::new(&config),
            Err(UpstreamError::Unauthorized)
        ));
    }
}
