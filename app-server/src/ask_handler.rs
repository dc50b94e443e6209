//! Ask handler for the app-server.
//!
//! Translates API requests into calls on the shared [`AskEngine`] and its
//! results back into response bodies.

use std::sync::Arc;

use askwhy_retrieval::{AskEngine, Message, Result, RetrievalError};
use tracing::info;

use crate::protocol::{
    AppendMessageParams, AppendMessageResponse, AskParams, AskResponse, HealthResponse,
    QueryParams, QueryResponse, RebuildResponse,
};

/// Handler for question answering and store maintenance.
#[derive(Clone)]
pub struct AskHandler {
    engine: Arc<AskEngine>,
}

impl AskHandler {
    /// Create a handler around an engine.
    pub fn new(engine: Arc<AskEngine>) -> Self {
        Self { engine }
    }

    /// Current state of the vector store.
    pub async fn health(&self) -> HealthResponse {
        let health = self.engine.health().await;
        HealthResponse {
            state: health.state,
            entries: health.entries,
            dimension: health.dimension,
            last_error: health.last_error,
        }
    }

    /// Answer a question from the chat history.
    pub async fn ask(&self, params: AskParams) -> Result<AskResponse> {
        let answer = self.engine.ask(&params.question).await?;

        info!(
            "Answered question with {} supporting snippets (prompt: {:?}, degraded: {})",
            answer.supporting_snippets.len(),
            answer.prompt_kind,
            answer.degraded
        );

        Ok(AskResponse {
            answer: answer.answer,
            supporting_snippets: answer.supporting_snippets,
            degraded: answer.degraded,
        })
    }

    /// Find the single closest stored message.
    ///
    /// Unlike [`AskHandler::ask`] the relevance threshold does not apply, so
    /// this shows what the retriever considers closest even when nothing is
    /// close enough to be used.
    pub async fn query(&self, params: QueryParams) -> Result<QueryResponse> {
        let best = self.engine.best_match(&params.query).await?;

        Ok(QueryResponse {
            best_match_index: best.index,
            query: params.query,
            similarity_score: best.score,
            text: best.text,
        })
    }

    /// Rebuild the store from the configured corpus file.
    pub async fn rebuild(&self) -> Result<RebuildResponse> {
        info!(
            "Rebuilding store from {}",
            self.engine.config().corpus_path.display()
        );
        let report = self.engine.rebuild().await?;

        Ok(RebuildResponse {
            entries: report.embedded,
            attempted: report.attempted,
            skipped: report.skipped,
        })
    }

    /// Append one message to the store.
    pub async fn append_message(
        &self,
        params: AppendMessageParams,
    ) -> Result<AppendMessageResponse> {
        if params.body.trim().is_empty() {
            return Err(RetrievalError::MalformedInput(
                "message body cannot be empty".to_string(),
            ));
        }
        let message = Message::new(&params.speaker, &params.body, params.timestamp, params.side);
        let entries = self.engine.append(message).await?;

        Ok(AppendMessageResponse { entries })
    }
}
