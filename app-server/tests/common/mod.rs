#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use askwhy_app_server::{AppConfig, AskHandler, build_engine, router};
use askwhy_embeddings::{
    EmbeddingError, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
};
use askwhy_retrieval::{AskEngine, GenerationProvider, Prompt, RetrievalError};
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const KEYWORDS: [&str; 3] = ["lunch", "gym", "dinner"];

/// Embeds text as one axis per keyword it mentions, plus an "other" axis
/// for text mentioning none. Text containing "unreachable" fails.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    fn default_model(&self) -> &str {
        "keyword"
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> askwhy_embeddings::Result<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = request.text.to_lowercase();
        if text.contains("unreachable") {
            return Err(EmbeddingError::ApiRequest {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let mut embedding: Vec<f32> = KEYWORDS
            .iter()
            .map(|k| if text.contains(k) { 1.0 } else { 0.0 })
            .collect();
        let other = if embedding.iter().all(|v| *v == 0.0) {
            1.0
        } else {
            0.0
        };
        embedding.push(other);

        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: "keyword".to_string(),
            tokens_used: None,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Answers with the number of history lines in the prompt, or always fails.
pub struct CountingGenerator {
    pub fail: bool,
}

#[async_trait]
impl GenerationProvider for CountingGenerator {
    fn name(&self) -> &str {
        "counting"
    }

    async fn generate(&self, prompt: &Prompt) -> askwhy_retrieval::Result<String> {
        if self.fail {
            return Err(RetrievalError::GenerationProvider("model offline".to_string()));
        }
        let lines = prompt
            .user
            .lines()
            .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
            .count();
        Ok(format!("answered from {lines} messages"))
    }
}

pub const CORPUS: &str = r#"[
    {"speaker": "Alex", "body": "Lunch at noon on Friday?", "timestamp": "2024-05-01 09:12", "side": "left"},
    {"speaker": "Sam", "body": "Gym at 6pm works for me", "timestamp": "2024-05-01 09:15", "side": "right"},
    {"time": "2024-05-01 09:20", "text": "Alex: see you", "side": "left"}
]"#;

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub engine: Arc<AskEngine>,
    pub embedder: Arc<KeywordEmbedder>,
    pub temp_dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn store_path(&self) -> PathBuf {
        self.temp_dir.path().join("vector_store.json")
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.temp_dir.path().join("messages.json")
    }
}

/// Start a server on an ephemeral port with a temp store and corpus.
pub async fn spawn_server(corpus: Option<&str>, failing_generator: bool) -> TestServer {
    let temp_dir = TempDir::new().unwrap();
    if let Some(corpus) = corpus {
        std::fs::write(temp_dir.path().join("messages.json"), corpus).unwrap();
    }

    let mut config = AppConfig::default();
    config.retrieval.store_path = temp_dir.path().join("vector_store.json");
    config.retrieval.corpus_path = temp_dir.path().join("messages.json");
    config.profile = config.profile.with_side("left", "Alex").with_side("right", "Sam");

    let embedder = Arc::new(KeywordEmbedder::default());
    let generator = Arc::new(CountingGenerator {
        fail: failing_generator,
    });
    let engine = build_engine(&config, embedder.clone(), generator).unwrap();
    engine.initialize().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AskHandler::new(engine.clone()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        client: reqwest::Client::new(),
        engine,
        embedder,
        temp_dir,
    }
}
