//! Request and response bodies of the HTTP API.

use askwhy_retrieval::{Snippet, SkippedMessage, StoreState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub state: StoreState,
    pub entries: usize,
    pub dimension: Option<usize>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskParams {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub supporting_snippets: Vec<Snippet>,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub best_match_index: usize,
    pub query: String,
    pub similarity_score: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildResponse {
    /// Entries in the new store.
    pub entries: usize,
    pub attempted: usize,
    pub skipped: Vec<SkippedMessage>,
}

/// One chat message to append, in the same shape as a structured corpus record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageParams {
    pub speaker: String,
    pub body: String,
    pub timestamp: String,
    pub side: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendMessageResponse {
    pub entries: usize,
}
