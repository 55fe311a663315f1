use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Malformed token: expected 3 segments, got {got}")]
    SegmentCount { got: usize },

    #[error("Base64 decode error: {0}")]
    Base64(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token payload is not a JSON object")]
    NotAnObject,

    #[error("Token payload has no usable exp claim")]
    MissingExpiry,
}

/// Failure reported by a [`SessionRefresher`](crate::SessionRefresher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RefreshError {
    pub message: String,
}

impl RefreshError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
