//! Error types for the retrieval core.

use askwhy_embeddings::EmbeddingError;
use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval core.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The store is empty or was never built.
    #[error("vector store unavailable")]
    StoreUnavailable,

    /// A vector does not match the dimension of the collection.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding provider failed.
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(#[source] EmbeddingError),

    /// The generation provider failed.
    #[error("generation provider error: {0}")]
    GenerationProvider(String),

    /// A build finished without a single usable entry.
    #[error("store build produced no entries ({attempted} messages attempted)")]
    EmptyBuild { attempted: usize },

    /// The caller sent something unusable.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A persisted store failed validation.
    #[error("invalid persisted store: {0}")]
    InvalidStore(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetrievalError {
    /// Whether the failure came from an external provider call.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            RetrievalError::EmbeddingProvider(_) | RetrievalError::GenerationProvider(_)
        )
    }
}

impl From<EmbeddingError> for RetrievalError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::DimensionMismatch { expected, actual } => {
                RetrievalError::DimensionMismatch { expected, actual }
            }
            other => RetrievalError::EmbeddingProvider(other),
        }
    }
}
