//! Error types for the chat pipeline.

use narthex_core::error::NarthexError;

/// Errors from one chat turn.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("search unavailable: {0}")]
    SearchUnavailable(String),
    #[error("chat error: {0}")]
    Internal(String),
}

impl From<NarthexError> for ChatError {
    fn from(err: NarthexError) -> Self {
        match err {
            NarthexError::SearchUnavailable(msg) => ChatError::SearchUnavailable(msg),
            other => ChatError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
    }

    #[test]
    fn test_search_unavailable_conversion_is_preserved() {
        let err: ChatError = NarthexError::SearchUnavailable("store down".to_string()).into();
        assert!(matches!(err, ChatError::SearchUnavailable(_)));

        let err: ChatError = NarthexError::Storage("disk full".to_string()).into();
        assert!(matches!(err, ChatError::Internal(_)));
    }
}
