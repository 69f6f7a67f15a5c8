//! Error type for generative model calls.

use thiserror::Error;

/// Errors from the generative client.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("model is not configured")]
    NotConfigured,
    #[error("model request failed: {0}")]
    Transport(String),
    #[error("model returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("model returned an empty response")]
    Empty,
}
