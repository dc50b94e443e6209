//! Building a vector store from source messages.

use askwhy_embeddings::{EmbeddingProvider, EmbeddingRequest};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DEFAULT_BUILD_CONCURRENCY;
use crate::error::{Result, RetrievalError};
use crate::message::Message;
use crate::store::VectorStore;

/// A message that was left out of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMessage {
    /// Position of the message in the source corpus.
    pub index: usize,
    pub reason: String,
}

/// What happened during a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub attempted: usize,
    pub embedded: usize,
    pub skipped: Vec<SkippedMessage>,
}

/// Embeds messages with a bounded number of provider calls in flight.
pub struct StoreBuilder<'a> {
    provider: &'a dyn EmbeddingProvider,
    concurrency: usize,
}

impl<'a> StoreBuilder<'a> {
    /// Create a builder using the default concurrency.
    pub fn new(provider: &'a dyn EmbeddingProvider) -> Self {
        Self {
            provider,
            concurrency: DEFAULT_BUILD_CONCURRENCY,
        }
    }

    /// Set how many embedding calls may run at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Build a new store from `messages`.
    ///
    /// Entries keep the order of `messages` regardless of which provider
    /// call finishes first. A failed embedding skips only its message; a
    /// build where every message fails is an [`RetrievalError::EmptyBuild`].
    /// An embedding whose dimension disagrees with the rest aborts the build.
    pub async fn build(&self, messages: &[Message]) -> Result<(VectorStore, BuildReport)> {
        let provider = self.provider;
        info!(
            "Building vector store from {} messages ({} concurrent requests, provider: {})",
            messages.len(),
            self.concurrency,
            provider.name()
        );

        // Requests own their text so the stream does not borrow `messages`.
        let requests: Vec<_> = messages
            .iter()
            .map(|message| {
                let request = EmbeddingRequest::new(message.text.clone());
                async move { provider.embed(request).await }
            })
            .collect();
        let outcomes: Vec<_> = stream::iter(requests)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut store = VectorStore::new();
        let mut report = BuildReport {
            attempted: messages.len(),
            ..BuildReport::default()
        };

        for ((index, message), outcome) in messages.iter().enumerate().zip(outcomes) {
            match outcome {
                Ok(response) => {
                    store.push(response.embedding, message.text.as_str(), message.metadata())?;
                    report.embedded += 1;
                }
                Err(e) => {
                    warn!("Skipping message {index}: embedding failed: {e}");
                    report.skipped.push(SkippedMessage {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if store.is_empty() {
            return Err(RetrievalError::EmptyBuild {
                attempted: report.attempted,
            });
        }

        info!(
            "Built vector store: {} embedded, {} skipped",
            report.embedded,
            report.skipped.len()
        );
        Ok((store, report))
    }
}
