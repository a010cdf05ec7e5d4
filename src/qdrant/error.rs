use thiserror::Error;

/// Result type for Qdrant client operations.
pub type Result<T> = std::result::Result<T, QdrantError>;

/// Errors raised while talking to the Qdrant REST API.
#[derive(Error, Debug)]
pub enum QdrantError {
    #[error("Cannot connect to Qdrant at {0}. Is Qdrant running?")]
    Connection(String),

    #[error("Request to Qdrant timed out after {0}s")]
    Timeout(u64),

    #[error("Qdrant health check failed with status {0}")]
    Unhealthy(u16),

    #[error("Qdrant API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse Qdrant response: {0}")]
    InvalidResponse(String),

    #[error("Invalid Qdrant URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
