//! Configuration for retrieval, store lifecycle and prompt assembly.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Default number of ranked entries kept per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Default minimum score for a ranked entry to become a snippet.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.45;

/// Default number of embedding calls in flight during a build.
pub const DEFAULT_BUILD_CONCURRENCY: usize = 4;

/// Configuration for the retrieval core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum number of ranked entries per query.
    pub top_k: usize,

    /// Minimum cosine similarity for a ranked entry to be surfaced.
    pub relevance_threshold: f32,

    /// Concurrent embedding requests while building the store.
    pub build_concurrency: usize,

    /// Where the serialized store lives.
    pub store_path: PathBuf,

    /// Source corpus used by build and rebuild.
    pub corpus_path: PathBuf,

    /// Build from the corpus at startup when no persisted store loads.
    pub rebuild_on_start: bool,
}

impl RetrievalConfig {
    /// Create a configuration with default tuning for the given files.
    pub fn new(store_path: impl Into<PathBuf>, corpus_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            corpus_path: corpus_path.into(),
            ..Self::default()
        }
    }

    /// Set the number of ranked entries.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the relevance threshold.
    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    /// Set the build concurrency.
    pub fn with_build_concurrency(mut self, concurrency: usize) -> Self {
        self.build_concurrency = concurrency;
        self
    }

    /// Reject values the retriever cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RetrievalError::Config("top_k must be at least 1".to_string()));
        }
        if self.build_concurrency == 0 {
            return Err(RetrievalError::Config(
                "build_concurrency must be at least 1".to_string(),
            ));
        }
        if !self.relevance_threshold.is_finite() {
            return Err(RetrievalError::Config(format!(
                "relevance_threshold must be a finite number, got {}",
                self.relevance_threshold
            )));
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            build_concurrency: DEFAULT_BUILD_CONCURRENCY,
            store_path: PathBuf::from("vector_store.json"),
            corpus_path: PathBuf::from("messages.json"),
            rebuild_on_start: true,
        }
    }
}

/// Whose perspective the assistant answers from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    /// Display name of the current user.
    pub name: String,

    /// Group or relationship the conversation belongs to.
    pub group: String,

    /// Side label to participant name, e.g. `right -> "Sam"`.
    pub sides: BTreeMap<String, String>,
}

impl UserProfile {
    /// Create a profile without side labels.
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            sides: BTreeMap::new(),
        }
    }

    /// Map a side label to a participant.
    pub fn with_side(mut self, side: impl Into<String>, participant: impl Into<String>) -> Self {
        self.sides.insert(side.into(), participant.into());
        self
    }

    /// Participant name for a side label, if known.
    pub fn participant(&self, side: &str) -> Option<&str> {
        self.sides.get(side).map(String::as_str)
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new("the user", "a private chat")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.relevance_threshold, 0.45);
        assert_eq!(config.build_concurrency, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(RetrievalConfig::default().with_top_k(0).validate().is_err());
        assert!(
            RetrievalConfig::default()
                .with_build_concurrency(0)
                .validate()
                .is_err()
        );
        assert!(
            RetrievalConfig::default()
                .with_relevance_threshold(f32::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RetrievalConfig = serde_json::from_str(r#"{"top_k": 3}"#).unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.relevance_threshold, DEFAULT_RELEVANCE_THRESHOLD);
    }

    #[test]
    fn test_profile_sides() {
        let profile = UserProfile::new("Sam", "family")
            .with_side("right", "Sam")
            .with_side("left", "Alex");
        assert_eq!(profile.participant("left"), Some("Alex"));
        assert_eq!(profile.participant("middle"), None);
    }
}
