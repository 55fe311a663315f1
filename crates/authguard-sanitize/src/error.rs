use thiserror::Error;

#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Nothing to sanitize: expected object or array")]
    NotAContainer,

    #[error("Input nested deeper than the maximum depth of {max_depth}")]
    TooDeep { max_depth: usize },

    #[error("Sanitized value does not match target type: {0}")]
    Deserialize(String),
}
