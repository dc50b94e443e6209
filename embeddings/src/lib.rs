//! # Embeddings
//!
//! Text embedding generation and vector similarity for AskWhy.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors through an
//!   OpenAI-compatible `/embeddings` endpoint
//! - **Similarity**: Cosine similarity between vectors of equal dimension
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingRequest ──► EmbeddingProvider ──► EmbeddingResponse   │
//! │                             │                      │            │
//! │                             ▼                      ▼            │
//! │                   OpenAICompatibleProvider  cosine_similarity   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAICompatibleProvider,
};
pub use similarity::{cosine_similarity, ensure_dimension};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
