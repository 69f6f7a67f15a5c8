use thiserror::Error;

/// Top-level error type for the Narthex system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates define
/// their own error types and convert into `NarthexError` at crate boundaries
/// so that the `?` operator works across the workspace.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NarthexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The resource store could not be reached or queried. Deliberately
    /// distinct from `Storage`: "store down" must never read as "zero
    /// search results".
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Knowledge base error: {0}")]
    Kb(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for NarthexError {
    fn from(err: toml::de::Error) -> Self {
        NarthexError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for NarthexError {
    fn from(err: toml::ser::Error) -> Self {
        NarthexError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for NarthexError {
    fn from(err: serde_json::Error) -> Self {
        NarthexError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Narthex operations.
pub type Result<T> = std::result::Result<T, NarthexError>;
