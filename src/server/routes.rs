//! Request handlers for the chat API
//!
//! The browser client sends `POST /api/chat` as plain JSON when the message
//! has no attachments and as a multipart form (`message` text field plus
//! `attachment_{i}` file parts and `attachment_{i}_type` declared-type
//! fields) when it does, so the chat handler accepts both shapes.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::mediator::{AttachmentKind, AttachmentRef, ChatError, ChatRequest};

use super::ServerAppState;

/// File extensions accepted for attachments (images, audio, video, and
/// common document types)
const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "webp", "mp3", "wav", "ogg", "mp4", "webm", "pdf", "doc", "docx",
    "txt",
];

const INVALID_FILE_TYPE_MESSAGE: &str =
    "Invalid file type. Only images, audio, video, and documents are allowed.";

/// JSON request body for attachment-free messages
#[derive(Debug, Deserialize)]
struct ChatMessageBody {
    #[serde(default)]
    message: Option<String>,
}

/// Boundary error raised while decoding the request, before it reaches the
/// mediator
enum ApiError {
    /// Client sent a malformed or disallowed request
    Validation(String),
    /// Reading the request body failed for reasons that are not the
    /// client's fault
    Internal(String),
}

impl ApiError {
    fn into_response(self, dev_mode: bool) -> Response {
        match self {
            Self::Validation(message) => error_response(StatusCode::BAD_REQUEST, &message),
            Self::Internal(detail) => internal_error_response(dev_mode, &detail),
        }
    }
}

/// Build a `{ "error": ... }` response with the given status
fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Generic 500 response; detail is only exposed outside production mode
fn internal_error_response(dev_mode: bool, detail: &str) -> Response {
    log::error!("Unhandled error: {}", detail);
    let body = if dev_mode {
        json!({ "error": "Internal server error", "details": detail })
    } else {
        json!({ "error": "Internal server error" })
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Health check endpoint
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "Server is running!",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 404 handler for unknown routes
pub async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Endpoint not found")
}

/// Chat endpoint: decode the request, run one chat turn through the
/// mediator, and map its outcome to an HTTP response
pub async fn chat_handler(State(state): State<ServerAppState>, req: Request) -> Response {
    let chat_request = match extract_chat_request(req).await {
        Ok(request) => request,
        Err(err) => return err.into_response(state.dev_mode),
    };

    match state.mediator.handle(&chat_request).await {
        Ok(response) => Json(response).into_response(),
        Err(err @ ChatError::EmptyRequest) => {
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        Err(err @ ChatError::InvalidApiKey) => {
            error_response(StatusCode::UNAUTHORIZED, &err.to_string())
        }
    }
}

/// Decode either request shape into a `ChatRequest`
async fn extract_chat_request(req: Request) -> Result<ChatRequest, ApiError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        extract_multipart_request(multipart).await
    } else {
        let Json(body) = Json::<ChatMessageBody>::from_request(req, &())
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::BytesRejection(e) => ApiError::Internal(e.to_string()),
                other => ApiError::Validation(other.body_text()),
            })?;
        Ok(ChatRequest::from_text(body.message.unwrap_or_default()))
    }
}

/// Walk the multipart fields collecting the message text, the file parts in
/// arrival order, and any declared-type override fields
async fn extract_multipart_request(mut multipart: Multipart) -> Result<ChatRequest, ApiError> {
    let mut text = String::new();
    // (name, content type, size) per file part, in arrival order
    let mut files: Vec<(String, String, u64)> = Vec::new();
    let mut type_overrides: HashMap<usize, String> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
            if !is_allowed_file(&file_name) {
                return Err(ApiError::Validation(INVALID_FILE_TYPE_MESSAGE.to_string()));
            }
            let mime = field.content_type().unwrap_or("").to_string();
            // Attachment bytes are only counted, never retained
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            files.push((file_name, mime, bytes.len() as u64));
        } else if field_name == "message" {
            text = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
        } else if let Some(idx) = type_override_index(&field_name) {
            let declared = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            type_overrides.insert(idx, declared);
        }
        // Unknown text fields are ignored
    }

    let attachments = files
        .into_iter()
        .enumerate()
        .map(|(idx, (name, mime, size_bytes))| {
            let declared = type_overrides
                .get(&idx)
                .map(String::as_str)
                .unwrap_or(&mime);
            AttachmentRef {
                name,
                kind: attachment_kind(declared),
                size_bytes,
            }
        })
        .collect();

    Ok(ChatRequest { text, attachments })
}

/// Parse the index out of an `attachment_{i}_type` field name
fn type_override_index(field_name: &str) -> Option<usize> {
    field_name
        .strip_prefix("attachment_")?
        .strip_suffix("_type")?
        .parse()
        .ok()
}

/// Map a declared type or MIME string to an attachment kind
fn attachment_kind(declared: &str) -> AttachmentKind {
    let lower = declared.to_lowercase();
    if lower.starts_with("image") {
        AttachmentKind::Image
    } else if lower.starts_with("audio") {
        AttachmentKind::Audio
    } else if lower.starts_with("video") {
        AttachmentKind::Video
    } else {
        AttachmentKind::File
    }
}

/// Extension allowlist check for uploaded files
fn is_allowed_file(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}
