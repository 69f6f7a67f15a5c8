//! Error types for the client orchestrators.

use thiserror::Error;

/// Failures reported by a gateway backend call.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The gateway answered 429; `retry_ms` is its hint, when present.
    #[error("rate limited")]
    RateLimited { retry_ms: Option<u64> },
    /// kb-query answered 404: the document has not been ingested yet.
    /// An expected state, not a failure.
    #[error("not ingested yet")]
    NotIngested,
    /// Any other non-success status.
    #[error("upstream error {status}: {body}")]
    Upstream { status: u16, body: String },
    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),
}

/// Errors surfaced to the caller of the chat controller.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("message cannot be empty")]
    EmptyMessage,
}
