// Chat turn orchestration: payload assembly, upstream call, outcome
// classification, and fallback substitution

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fallback;
use crate::upstream::{CompletionRequest, CompletionResponse, UpstreamError, UpstreamLlm};

/// Note attached to responses produced by the fallback after a 429
pub const RATE_LIMIT_NOTE: &str = "Rate limit reached - using fallback response. Please try again in a moment for AI-powered responses.";

/// Note attached to responses produced by the fallback after any other failure
pub const UNAVAILABLE_NOTE: &str = "Using fallback response due to API unavailability.";

/// Reply when the provider returns a 2xx with no choices at all
const EMPTY_CHOICES_REPLY: &str = "Hello! I received your message. How can I help you today?";

/// Reply when the first choice exists but carries no content
const EMPTY_CONTENT_REPLY: &str =
    "I understand your message, but I need a moment to process it properly.";

/// Declared type of an uploaded attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
    Video,
    File,
}

/// Metadata for one user-supplied attachment. The mediator only reads the
/// name to build a textual summary; attachment bytes never reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub kind: AttachmentKind,
    pub size_bytes: u64,
}

/// One incoming chat turn. Valid iff text is non-empty or at least one
/// attachment is present.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub text: String,
    pub attachments: Vec<AttachmentRef>,
}

impl ChatRequest {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }
}

/// Normalized reply returned to the HTTP layer
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(rename = "response")]
    pub response_text: String,
    /// ISO-8601 timestamp of when the reply was produced
    pub timestamp: String,
    /// Present when the reply came from the fallback responder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ChatResponse {
    fn now(response_text: String, note: Option<&str>) -> Self {
        Self {
            success: true,
            response_text,
            timestamp: Utc::now().to_rfc3339(),
            note: note.map(|n| n.to_string()),
        }
    }
}

/// Errors that surface to the caller instead of being absorbed into fallback
#[derive(Debug, Error)]
pub enum ChatError {
    /// Request had neither text nor attachments
    #[error("Message or file attachment is required")]
    EmptyRequest,

    /// The provider rejected the configured API key; misconfiguration,
    /// not transient unavailability, so no fallback
    #[error("Invalid Groq API key. Please check your configuration.")]
    InvalidApiKey,
}

/// Orchestrates one chat turn end-to-end. Stateless across calls; concurrent
/// turns share nothing but the upstream client.
pub struct ChatMediator {
    upstream: Option<Arc<dyn UpstreamLlm>>,
}

impl ChatMediator {
    /// Mediator backed by a live upstream client
    pub fn new(upstream: Arc<dyn UpstreamLlm>) -> Self {
        Self {
            upstream: Some(upstream),
        }
    }

    /// Mediator with no upstream configured: every request degrades directly
    /// to the fallback responder instead of attempting a doomed call
    pub fn without_upstream() -> Self {
        Self { upstream: None }
    }

    /// Handle one chat turn. Transient upstream failures are absorbed into a
    /// fallback reply; only validation failures and credential rejection
    /// surface as errors.
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        if request.is_empty() {
            return Err(ChatError::EmptyRequest);
        }

        let user_content = build_user_content(&request.text, &request.attachments);

        let upstream = match &self.upstream {
            Some(upstream) => upstream,
            None => {
                log::warn!("No API key configured - using fallback response");
                return Ok(self.fallback_response(&request.text, UNAVAILABLE_NOTE));
            }
        };

        let completion_request = CompletionRequest::for_user_content(user_content);

        match upstream.complete(&completion_request).await {
            Ok(response) => Ok(ChatResponse::now(reply_from_completion(&response), None)),
            Err(UpstreamError::Unauthorized) => Err(ChatError::InvalidApiKey),
            Err(UpstreamError::RateLimited) => {
                log::warn!("Rate limit exceeded - using fallback response");
                Ok(self.fallback_response(&request.text, RATE_LIMIT_NOTE))
            }
            Err(err) => {
                // 400 ("model might not be available"), 5xx, and transport
                // failures all take the same path
                log::error!("Groq API call failed: {}", err);
                Ok(self.fallback_response(&request.text, UNAVAILABLE_NOTE))
            }
        }
    }

    fn fallback_response(&self, text: &str, note: &str) -> ChatResponse {
        ChatResponse::now(fallback::respond(text).to_string(), Some(note))
    }
}

/// Assemble the user-content string: trimmed text plus, when attachments are
/// present, a human-readable summary listing each name in order.
pub fn build_user_content(text: &str, attachments: &[AttachmentRef]) -> String {
    let trimmed = text.trim();
    if attachments.is_empty() {
        return trimmed.to_string();
    }

    let names: Vec<&str> = attachments.iter().map(|a| a.name.as_str()).collect();
    format!(
        "{}\n[User attached {} file(s): {}]",
        trimmed,
        attachments.len(),
        names.join(", ")
    )
}

/// Extract the reply text from a successful completion
fn reply_from_completion(response: &CompletionResponse) -> String {
    match response.choices.first() {
        Some(choice) => match &choice.message.content {
            Some(content) if !content.is_empty() => content.clone(),
            _ => EMPTY_CONTENT_REPLY.to_string(),
        },
        None => EMPTY_CHOICES_REPLY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(name: &str) -> AttachmentRef {
        AttachmentRef {
            name: name.to_string(),
            kind: AttachmentKind::File,
            size_bytes: 42,
        }
    }

    #[test]
    fn test_user_content_without_attachments_is_trimmed_text() {
        assert_eq!(build_user_content("  hello world  ", &[]), "hello world");
    }

    #[test]
    fn test_user_content_with_attachments_has_summary_suffix() {
        let attachments = vec![attachment("report.pdf"), attachment("photo.png")];
        let content = build_user_content("see these", &attachments);
        assert_eq!(
            content,
            "see these\n[User attached 2 file(s): report.pdf, photo.png]"
        );
    }

    #[test]
    fn test_user_content_preserves_attachment_order() {
        let attachments = vec![attachment("b.txt"), attachment("a.txt")];
        let content = build_user_content("x", &attachments);
        assert!(content.ends_with("[User attached 2 file(s): b.txt, a.txt]"));
    }

    #[test]
    fn test_empty_text_with_attachment_is_valid() {
        let request = ChatRequest {
            text: String::new(),
            attachments: vec![attachment("voice.mp3")],
        };
        assert!(!request.is_empty());
    }

    #[test]
    fn test_whitespace_only_text_is_empty() {
        let request = ChatRequest::from_text("   ");
        assert!(request.is_empty());
    }

    #[test]
    fn test_reply_from_completion_with_content() {
        let response: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"sure thing"}}]}"#).unwrap();
        assert_eq!(reply_from_completion(&response), "sure thing");
    }

    #[test]
    fn test_reply_from_completion_empty_choices() {
        let response: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(reply_from_completion(&response), EMPTY_CHOICES_REPLY);
    }

    #[test]
    fn test_reply_from_completion_null_content() {
        let response: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(reply_from_completion(&response), EMPTY_CONTENT_REPLY);
    }
}
