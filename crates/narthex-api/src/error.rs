//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.
//! 404 from kb-query is a meaningful, expected state ("not yet
//! ingested"), not a fault.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use narthex_chat::ChatError;
use narthex_kb::KbError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 400 Bad Request with a custom machine-readable code and details.
    BadRequestCode {
        code: &'static str,
        message: String,
        details: Option<serde_json::Value>,
    },
    /// 404 Not Found - resource does not exist (or is not yet ingested).
    NotFound(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502-style upstream fetch failure with the upstream status attached.
    UpstreamFetch { status: u16, message: String },
    /// 503 Service Unavailable - component not ready.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request".to_string(), msg, None)
            }
            ApiError::BadRequestCode {
                code,
                message,
                details,
            } => (StatusCode::BAD_REQUEST, code.to_string(), message, details),
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "not_found".to_string(), msg, None)
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error".to_string(),
                msg,
                None,
            ),
            ApiError::UpstreamFetch { status, message } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                "fetch_failed".to_string(),
                message,
                Some(serde_json::json!({ "status": status })),
            ),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable".to_string(),
                msg,
                None,
            ),
        };

        let body = ErrorBody {
            error: error_code,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<narthex_core::error::NarthexError> for ApiError {
    fn from(err: narthex_core::error::NarthexError) -> Self {
        use narthex_core::error::NarthexError;
        match &err {
            NarthexError::Config(msg) => ApiError::BadRequest(msg.clone()),
            NarthexError::SearchUnavailable(msg) => ApiError::Internal(msg.clone()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match &err {
            ChatError::EmptyMessage | ChatError::MessageTooLong(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::SearchUnavailable(_) => {
                ApiError::Internal("search backend unavailable".to_string())
            }
            ChatError::Internal(msg) => ApiError::Internal(msg.clone()),
        }
    }
}

impl From<KbError> for ApiError {
    fn from(err: KbError) -> Self {
        match &err {
            KbError::NoUrl | KbError::NotGoogleDocsUrl(_) | KbError::InvalidGoogleDocsUrl(_) => {
                ApiError::BadRequestCode {
                    code: err.code(),
                    message: err.to_string(),
                    details: None,
                }
            }
            KbError::FetchFailed { status } => ApiError::UpstreamFetch {
                status: *status,
                message: err.to_string(),
            },
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
