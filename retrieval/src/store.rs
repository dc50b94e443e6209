//! The vector store and its persisted form.
//!
//! Entries live in three parallel collections (embeddings, texts, metadata)
//! that share a position. The fields are private and every mutation goes
//! through [`VectorStore::push`], so the collections always have the same
//! length and every embedding has the same dimension.

use std::path::Path;

use askwhy_embeddings::{Embedding, ensure_dimension};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Result, RetrievalError};
use crate::message::MessageMetadata;

/// Version written into every persisted store.
pub const STORE_SCHEMA_VERSION: u32 = 1;

/// A borrowed view of one stored entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreEntry<'a> {
    pub index: usize,
    pub embedding: &'a [f32],
    pub text: &'a str,
    pub metadata: &'a MessageMetadata,
}

/// In-memory collection of (embedding, text, metadata) triples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorStore {
    /// Dimension shared by all embeddings, `None` while empty.
    dimension: Option<usize>,
    embeddings: Vec<Embedding>,
    texts: Vec<String>,
    metadata: Vec<MessageMetadata>,
}

impl VectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry to all three collections.
    ///
    /// The first entry fixes the dimension of the store.
    pub fn push(
        &mut self,
        embedding: Embedding,
        text: impl Into<String>,
        metadata: MessageMetadata,
    ) -> Result<()> {
        if embedding.is_empty() {
            return Err(RetrievalError::InvalidStore(
                "cannot store an empty embedding".to_string(),
            ));
        }
        match self.dimension {
            Some(expected) => ensure_dimension(expected, &embedding)?,
            None => self.dimension = Some(embedding.len()),
        }

        self.embeddings.push(embedding);
        self.texts.push(text.into());
        self.metadata.push(metadata);
        Ok(())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Dimension of the stored embeddings, `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// All embeddings in insertion order.
    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    /// All texts in insertion order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Get the entry at `index`.
    pub fn entry(&self, index: usize) -> Option<StoreEntry<'_>> {
        Some(StoreEntry {
            index,
            embedding: self.embeddings.get(index)?,
            text: self.texts.get(index)?,
            metadata: self.metadata.get(index)?,
        })
    }

    /// Serialize the store to JSON.
    pub fn to_json(&self) -> Result<String> {
        let persisted = PersistedStoreRef {
            version: STORE_SCHEMA_VERSION,
            dimension: self.dimension.unwrap_or(0),
            embeddings: &self.embeddings,
            texts: &self.texts,
            metadata: &self.metadata,
        };
        Ok(serde_json::to_string(&persisted)?)
    }

    /// Parse and validate a persisted store.
    ///
    /// Anything other than a non-empty, version-matching, length- and
    /// dimension-consistent store is rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let persisted: PersistedStore = serde_json::from_str(json)?;

        if persisted.version != STORE_SCHEMA_VERSION {
            return Err(RetrievalError::InvalidStore(format!(
                "unsupported schema version {} (expected {STORE_SCHEMA_VERSION})",
                persisted.version
            )));
        }

        let len = persisted.embeddings.len();
        if persisted.texts.len() != len || persisted.metadata.len() != len {
            return Err(RetrievalError::InvalidStore(format!(
                "collection lengths differ: {len} embeddings, {} texts, {} metadata",
                persisted.texts.len(),
                persisted.metadata.len()
            )));
        }
        if len == 0 {
            return Err(RetrievalError::InvalidStore("store is empty".to_string()));
        }

        let mut store = Self::new();
        for ((embedding, text), metadata) in persisted
            .embeddings
            .into_iter()
            .zip(persisted.texts)
            .zip(persisted.metadata)
        {
            ensure_dimension(persisted.dimension, &embedding)?;
            store.push(embedding, text, metadata)?;
        }
        Ok(store)
    }

    /// Write the store to `path`, replacing any previous file atomically.
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_json()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = Path::new(&temp_name);

        fs::write(temp_path, &content).await?;
        fs::rename(temp_path, path).await?;

        debug!("Saved {} store entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Load a persisted store.
    ///
    /// Returns `None` when the file is missing or fails validation; the
    /// caller then rebuilds or serves an empty store.
    pub async fn load(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No persisted store at {}", path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read persisted store {}: {e}", path.display());
                return None;
            }
        };

        match Self::from_json(&content) {
            Ok(store) => {
                info!(
                    "Loaded {} store entries from {}",
                    store.len(),
                    path.display()
                );
                Some(store)
            }
            Err(e) => {
                warn!("Ignoring persisted store {}: {e}", path.display());
                None
            }
        }
    }
}

#[derive(Serialize)]
struct PersistedStoreRef<'a> {
    version: u32,
    dimension: usize,
    embeddings: &'a [Embedding],
    texts: &'a [String],
    metadata: &'a [MessageMetadata],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PersistedStore {
    version: u32,
    dimension: usize,
    embeddings: Vec<Embedding>,
    texts: Vec<String>,
    metadata: Vec<MessageMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn meta(timestamp: &str, side: &str) -> MessageMetadata {
        MessageMetadata {
            timestamp: timestamp.to_string(),
            side: side.to_string(),
        }
    }

    fn sample_store() -> VectorStore {
        let mut store = VectorStore::new();
        store
            .push(vec![0.1, 0.2, 0.3], "A: lunch at noon", meta("t1", "left"))
            .unwrap();
        store
            .push(
                vec![-0.123_456_79, 1.0e-7, 42.5],
                "B: gym at 6pm",
                meta("t2", "right"),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_push_keeps_collections_aligned() {
        let store = sample_store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.dimension(), Some(3));
        assert_eq!(store.texts().len(), store.embeddings().len());

        let entry = store.entry(1).unwrap();
        assert_eq!(entry.text, "B: gym at 6pm");
        assert_eq!(entry.metadata.side, "right");
        assert!(store.entry(2).is_none());
    }

    #[test]
    fn test_push_rejects_other_dimension() {
        let mut store = sample_store();
        let err = store
            .push(vec![1.0, 0.0], "C: hello", meta("t3", "left"))
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let store = sample_store();
        let restored = VectorStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(restored.texts(), store.texts());
        assert_eq!(restored.dimension(), store.dimension());
        assert_eq!(restored.entry(1).unwrap().metadata, store.entry(1).unwrap().metadata);
        assert_embeddings_close(&restored, &store);
    }

    fn assert_embeddings_close(a: &VectorStore, b: &VectorStore) {
        assert_eq!(a.len(), b.len());
        for (left, right) in a.embeddings().iter().zip(b.embeddings()) {
            for (x, y) in left.iter().zip(right) {
                assert!((x - y).abs() <= f32::EPSILON * y.abs().max(1.0), "{x} != {y}");
            }
        }
    }

    #[test]
    fn test_from_json_rejects_wrong_version() {
        let json = r#"{"version": 2, "dimension": 1, "embeddings": [[1.0]],
            "texts": ["a"], "metadata": [{"timestamp": "t", "side": "l"}]}"#;
        assert!(matches!(
            VectorStore::from_json(json),
            Err(RetrievalError::InvalidStore(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_length_mismatch() {
        let json = r#"{"version": 1, "dimension": 1, "embeddings": [[1.0], [0.5]],
            "texts": ["a"], "metadata": [{"timestamp": "t", "side": "l"}]}"#;
        assert!(matches!(
            VectorStore::from_json(json),
            Err(RetrievalError::InvalidStore(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_ragged_embeddings() {
        let json = r#"{"version": 1, "dimension": 2, "embeddings": [[1.0, 0.0], [0.5]],
            "texts": ["a", "b"],
            "metadata": [{"timestamp": "t", "side": "l"}, {"timestamp": "t", "side": "r"}]}"#;
        assert!(matches!(
            VectorStore::from_json(json),
            Err(RetrievalError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_legacy_tuple_shape() {
        let json = r#"[[[1.0, 0.0]], ["a"]]"#;
        assert!(VectorStore::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_rejects_empty_store() {
        assert!(VectorStore::from_json(&VectorStore::new().to_json().unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_persist_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/store.json");
        let store = sample_store();

        store.persist(&path).await.unwrap();
        let loaded = VectorStore::load(&path).await.unwrap();

        assert_eq!(loaded.texts(), store.texts());
        assert_eq!(loaded.entry(0).unwrap().metadata, store.entry(0).unwrap().metadata);
        assert_embeddings_close(&loaded, &store);
        assert!(!temp_dir.path().join("nested/store.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_persist_replaces_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        sample_store().persist(&path).await.unwrap();
        let mut smaller = VectorStore::new();
        smaller.push(vec![1.0], "only", meta("t", "left")).unwrap();
        smaller.persist(&path).await.unwrap();

        assert_eq!(VectorStore::load(&path).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_or_corrupt_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        assert!(VectorStore::load(&path).await.is_none());

        std::fs::write(&path, b"\x80not json").unwrap();
        assert!(VectorStore::load(&path).await.is_none());
    }
}
