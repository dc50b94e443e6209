//! The ask engine: owns the shared vector store and answers questions.

use std::sync::Arc;

use askwhy_embeddings::{EmbeddingProvider, EmbeddingRequest};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::assembler::{PromptKind, assemble};
use crate::builder::{BuildReport, StoreBuilder};
use crate::config::{RetrievalConfig, UserProfile};
use crate::error::{Result, RetrievalError};
use crate::generation::GenerationProvider;
use crate::message::{Message, load_corpus};
use crate::retriever::{Snippet, rank, retrieve};
use crate::store::VectorStore;

/// Answer returned when the generation provider fails.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't generate an answer right now. Please try again in a moment.";

/// Lifecycle state of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    Uninitialized,
    Building,
    Ready,
    /// The last build failed. The previous snapshot, if any, is still served.
    Failed,
}

/// Store status as reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    pub state: StoreState,
    pub entries: usize,
    pub dimension: Option<usize>,
    pub last_error: Option<String>,
}

/// Result of asking a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub supporting_snippets: Vec<Snippet>,
    /// Which prompt template produced the answer.
    pub prompt_kind: PromptKind,
    /// True when the generator failed and [`FALLBACK_ANSWER`] was used.
    pub degraded: bool,
}

/// Closest stored message to a query, regardless of threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestMatch {
    pub index: usize,
    pub text: String,
    pub score: f32,
}

#[derive(Debug)]
struct Status {
    state: StoreState,
    last_error: Option<String>,
}

/// Question answering over a shared, swappable vector store.
///
/// Readers take an `Arc` snapshot of the current store and never hold the
/// lock while calling providers. Rebuild and append build a complete new
/// store and publish it with a single pointer swap, so a reader always sees
/// either the old store or the new one.
pub struct AskEngine {
    config: RetrievalConfig,
    profile: UserProfile,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    store: RwLock<Arc<VectorStore>>,
    status: RwLock<Status>,
    /// Serializes rebuild and append.
    writer: Mutex<()>,
}

impl AskEngine {
    /// Create a new engine builder.
    pub fn builder() -> AskEngineBuilder {
        AskEngineBuilder::new()
    }

    /// Create an engine with an empty store.
    pub fn new(
        config: RetrievalConfig,
        profile: UserProfile,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            profile,
            embedder,
            generator,
            store: RwLock::new(Arc::new(VectorStore::new())),
            status: RwLock::new(Status {
                state: StoreState::Uninitialized,
                last_error: None,
            }),
            writer: Mutex::new(()),
        })
    }

    /// The engine configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// The current store snapshot.
    pub async fn snapshot(&self) -> Arc<VectorStore> {
        Arc::clone(&*self.store.read().await)
    }

    /// Current lifecycle state and size of the store.
    pub async fn health(&self) -> StoreHealth {
        let store = self.snapshot().await;
        let status = self.status.read().await;
        StoreHealth {
            state: status.state,
            entries: store.len(),
            dimension: store.dimension(),
            last_error: status.last_error.clone(),
        }
    }

    /// Bring the store up at startup.
    ///
    /// Loads the persisted store; when that is absent and
    /// `rebuild_on_start` is set, builds from the corpus instead. A failed
    /// build is logged and leaves the engine serving an empty store.
    pub async fn initialize(&self) -> StoreState {
        if let Some(store) = VectorStore::load(&self.config.store_path).await {
            self.publish(store).await;
            self.set_status(StoreState::Ready, None).await;
            return StoreState::Ready;
        }

        if !self.config.rebuild_on_start {
            info!("No persisted store and rebuild_on_start is off; starting empty");
            return self.status.read().await.state;
        }

        match self.rebuild().await {
            Ok(_) => StoreState::Ready,
            Err(e) => {
                error!("Initial store build failed: {e}");
                StoreState::Failed
            }
        }
    }

    /// Rebuild the store from the configured corpus file.
    pub async fn rebuild(&self) -> Result<BuildReport> {
        let _writer = self.writer.lock().await;
        self.set_status(StoreState::Building, None).await;

        let outcome = match load_corpus(&self.config.corpus_path).await {
            Ok(messages) => self.build_and_publish(&messages).await,
            Err(e) => Err(e),
        };
        self.finish_build(outcome).await
    }

    /// Rebuild the store from the given messages.
    pub async fn rebuild_from(&self, messages: &[Message]) -> Result<BuildReport> {
        let _writer = self.writer.lock().await;
        self.set_status(StoreState::Building, None).await;

        let outcome = self.build_and_publish(messages).await;
        self.finish_build(outcome).await
    }

    /// Embed one message and append it to the store.
    ///
    /// Returns the new number of entries. Works on a never-built engine by
    /// starting from an empty store.
    pub async fn append(&self, message: Message) -> Result<usize> {
        if message.text.trim().is_empty() {
            return Err(RetrievalError::MalformedInput(
                "message text cannot be empty".to_string(),
            ));
        }

        let _writer = self.writer.lock().await;
        let embedding = self.embed_text(&message.text).await?;

        let mut store = (*self.snapshot().await).clone();
        store.push(embedding, message.text.as_str(), message.metadata())?;
        let entries = store.len();

        self.persist(&store).await;
        self.publish(store).await;
        self.set_status(StoreState::Ready, None).await;

        debug!("Appended message, store now has {entries} entries");
        Ok(entries)
    }

    /// Answer a question from the stored chat history.
    ///
    /// Fails with [`RetrievalError::MalformedInput`] for a blank question
    /// and [`RetrievalError::StoreUnavailable`] for an empty store, in both
    /// cases before the query is embedded. A generation failure does not
    /// fail the request; the answer is replaced by [`FALLBACK_ANSWER`].
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = validate_text(question, "question")?;
        let store = self.available_snapshot().await?;

        let query = self.embed_text(question).await?;
        let retrieval = retrieve(
            &query,
            &store,
            self.config.top_k,
            self.config.relevance_threshold,
        )?;

        let prompt = assemble(question, &retrieval.snippets, &self.profile);
        let (answer, degraded) = match self.generator.generate(&prompt).await {
            Ok(answer) => (answer, false),
            Err(e) => {
                warn!("Generation failed, using fallback answer: {e}");
                (FALLBACK_ANSWER.to_string(), true)
            }
        };

        Ok(Answer {
            answer,
            supporting_snippets: retrieval.snippets,
            prompt_kind: prompt.kind,
            degraded,
        })
    }

    /// Find the single closest stored message, ignoring the threshold.
    pub async fn best_match(&self, query: &str) -> Result<BestMatch> {
        let query = validate_text(query, "query")?;
        let store = self.available_snapshot().await?;

        let vector = self.embed_text(query).await?;
        let best = rank(&vector, store.embeddings(), 1)?
            .into_iter()
            .next()
            .ok_or(RetrievalError::StoreUnavailable)?;
        let entry = store
            .entry(best.index)
            .ok_or(RetrievalError::StoreUnavailable)?;

        Ok(BestMatch {
            index: best.index,
            text: entry.text.to_string(),
            score: best.score,
        })
    }

    async fn available_snapshot(&self) -> Result<Arc<VectorStore>> {
        let store = self.snapshot().await;
        if store.is_empty() {
            return Err(RetrievalError::StoreUnavailable);
        }
        Ok(store)
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let response = self.embedder.embed(EmbeddingRequest::new(text)).await?;
        Ok(response.embedding)
    }

    async fn build_and_publish(&self, messages: &[Message]) -> Result<BuildReport> {
        let (store, report) = StoreBuilder::new(self.embedder.as_ref())
            .with_concurrency(self.config.build_concurrency)
            .build(messages)
            .await?;

        self.persist(&store).await;
        self.publish(store).await;
        Ok(report)
    }

    async fn finish_build(&self, outcome: Result<BuildReport>) -> Result<BuildReport> {
        match &outcome {
            Ok(_) => self.set_status(StoreState::Ready, None).await,
            Err(e) => {
                warn!("Store build failed, keeping previous store: {e}");
                self.set_status(StoreState::Failed, Some(e.to_string()))
                    .await;
            }
        }
        outcome
    }

    /// Write the store to disk. Failure only costs durability.
    async fn persist(&self, store: &VectorStore) {
        if let Err(e) = store.persist(&self.config.store_path).await {
            warn!(
                "Failed to persist store to {}: {e}",
                self.config.store_path.display()
            );
        }
    }

    async fn publish(&self, store: VectorStore) {
        let entries = store.len();
        *self.store.write().await = Arc::new(store);
        info!("Published vector store with {entries} entries");
    }

    async fn set_status(&self, state: StoreState, last_error: Option<String>) {
        let mut status = self.status.write().await;
        status.state = state;
        status.last_error = last_error;
    }
}

fn validate_text<'a>(text: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RetrievalError::MalformedInput(format!(
            "{what} cannot be empty"
        )));
    }
    Ok(trimmed)
}

/// Builder for [`AskEngine`].
pub struct AskEngineBuilder {
    config: RetrievalConfig,
    profile: UserProfile,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn GenerationProvider>>,
}

impl AskEngineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: RetrievalConfig::default(),
            profile: UserProfile::default(),
            embedder: None,
            generator: None,
        }
    }

    /// Set the retrieval configuration.
    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the user profile.
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the embedding provider.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the generation provider.
    pub fn with_generator(mut self, generator: Arc<dyn GenerationProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<AskEngine> {
        let embedder = self
            .embedder
            .ok_or_else(|| RetrievalError::Config("no embedding provider set".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| RetrievalError::Config("no generation provider set".to_string()))?;
        AskEngine::new(self.config, self.profile, embedder, generator)
    }
}

impl Default for AskEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
