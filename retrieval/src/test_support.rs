//! In-process providers for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use askwhy_embeddings::{
    Embedding, EmbeddingError, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
};
use async_trait::async_trait;

use crate::assembler::Prompt;
use crate::error::{Result, RetrievalError};
use crate::generation::GenerationProvider;

/// Embedder that looks vectors up by exact text.
#[derive(Default)]
pub struct FakeEmbedder {
    vectors: HashMap<String, Embedding>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, text: &str, vector: Embedding) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn name(&self) -> &str {
        "fake"
    }

    fn default_model(&self) -> &str {
        "fake-embed"
    }

    async fn embed(&self, request: EmbeddingRequest) -> askwhy_embeddings::Result<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&request.text) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&request.text) {
            return Err(EmbeddingError::ApiRequest {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let embedding = self
            .vectors
            .get(&request.text)
            .cloned()
            .ok_or_else(|| EmbeddingError::InvalidResponse(format!("no vector for {}", request.text)))?;
        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: "fake-embed".to_string(),
            tokens_used: None,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Generator that echoes a fixed answer, or fails, and remembers prompts.
pub struct FakeGenerator {
    answer: Option<String>,
    prompts: Mutex<Vec<Prompt>>,
}

impl FakeGenerator {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for FakeGenerator {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.answer
            .clone()
            .ok_or_else(|| RetrievalError::GenerationProvider("model offline".to_string()))
    }
}
