//! Error types for knowledge-base operations.

use narthex_core::error::NarthexError;

/// Errors from document fetching and ingestion.
#[derive(Debug, thiserror::Error)]
pub enum KbError {
    #[error("no URL provided")]
    NoUrl,
    #[error("not a Google Docs URL: {0}")]
    NotGoogleDocsUrl(String),
    #[error("could not extract a document id from: {0}")]
    InvalidGoogleDocsUrl(String),
    #[error("document export failed with status {status}")]
    FetchFailed { status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("document contained no extractable text")]
    EmptyDocument,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<NarthexError> for KbError {
    fn from(err: NarthexError) -> Self {
        KbError::Storage(err.to_string())
    }
}

impl KbError {
    /// Stable machine-readable code, used in gateway error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            KbError::NoUrl => "no_url_provided",
            KbError::NotGoogleDocsUrl(_) => "not_google_docs_url",
            KbError::InvalidGoogleDocsUrl(_) => "invalid_google_docs_url",
            KbError::FetchFailed { .. } => "fetch_failed",
            KbError::Network(_) => "fetch_error",
            KbError::EmptyDocument => "empty_document",
            KbError::Storage(_) => "storage_error",
        }
    }
}
