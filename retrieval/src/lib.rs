//! # Retrieval
//!
//! Retrieval-augmented question answering over a chat history:
//!
//! - **Store**: Embeddings, texts and citation metadata kept in lockstep
//! - **Retriever**: Brute-force cosine ranking with a relevance threshold
//! - **Assembler**: Grounded or no-history prompts from retrieved snippets
//! - **Engine**: Store lifecycle (load, build, append) and the ask flow
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           AskEngine                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   question ──► EmbeddingProvider ──► query vector               │
//! │                                          │                      │
//! │                                          ▼                      │
//! │   StoreBuilder ──► VectorStore ──► Retriever (top K, threshold) │
//! │        ▲              │  ▲                │                     │
//! │        │              ▼  │                ▼                     │
//! │   messages.json   vector_store.json   Assembler ──► Generator   │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use askwhy_retrieval::{AskEngine, RetrievalConfig};
//!
//! let engine = AskEngine::builder()
//!     .with_config(RetrievalConfig::new("vector_store.json", "messages.json"))
//!     .with_embedder(embedder)
//!     .with_generator(generator)
//!     .build()?;
//!
//! engine.initialize().await;
//! let answer = engine.ask("When is lunch on Friday?").await?;
//! ```

pub mod assembler;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod message;
pub mod retriever;
pub mod store;

#[cfg(test)]
mod test_support;

pub use assembler::{Prompt, PromptKind, assemble};
pub use builder::{BuildReport, SkippedMessage, StoreBuilder};
pub use config::{RetrievalConfig, UserProfile};
pub use engine::{
    Answer, AskEngine, AskEngineBuilder, BestMatch, FALLBACK_ANSWER, StoreHealth, StoreState,
};
pub use error::{Result, RetrievalError};
pub use generation::{GenerationProvider, OpenAIChatProvider};
pub use message::{Message, MessageMetadata, SourceRecord, load_corpus, parse_corpus};
pub use retriever::{Ranked, Retrieval, Snippet, filter_relevant, rank, retrieve};
pub use store::{STORE_SCHEMA_VERSION, StoreEntry, VectorStore};
