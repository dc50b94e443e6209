//! Chat messages and the source corpus they are imported from.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::{Result, RetrievalError};

/// Citation data stored next to every embedded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Opaque time label, only used for citation.
    pub timestamp: String,

    /// Which participant wrote the message.
    pub side: String,
}

/// One unit of source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Displayable content, usually `"{speaker}: {body}"`.
    pub text: String,

    /// Opaque time label.
    pub timestamp: String,

    /// Side label of the author.
    pub side: String,
}

impl Message {
    /// Build a message from its speaker and body.
    pub fn new(
        speaker: &str,
        body: &str,
        timestamp: impl Into<String>,
        side: impl Into<String>,
    ) -> Self {
        Self {
            text: format!("{}: {}", speaker.trim(), body.trim()),
            timestamp: timestamp.into(),
            side: side.into(),
        }
    }

    /// Metadata to store alongside the embedding.
    pub fn metadata(&self) -> MessageMetadata {
        MessageMetadata {
            timestamp: self.timestamp.clone(),
            side: self.side.clone(),
        }
    }
}

/// One record of the import file.
///
/// Exports come in two shapes: structured records with a separate speaker
/// and body, and flat records whose `text` is already the display string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceRecord {
    Structured {
        speaker: String,
        body: String,
        #[serde(alias = "time")]
        timestamp: String,
        side: String,
    },
    Flat {
        text: String,
        #[serde(alias = "time")]
        timestamp: String,
        side: String,
    },
}

impl SourceRecord {
    /// Convert to a message, or `None` when there is nothing to embed.
    pub fn into_message(self) -> Option<Message> {
        let message = match self {
            SourceRecord::Structured {
                speaker,
                body,
                timestamp,
                side,
            } => {
                if body.trim().is_empty() {
                    return None;
                }
                Message::new(&speaker, &body, timestamp, side)
            }
            SourceRecord::Flat {
                text,
                timestamp,
                side,
            } => Message {
                text,
                timestamp,
                side,
            },
        };
        (!message.text.trim().is_empty()).then_some(message)
    }
}

/// Parse a corpus from its JSON text.
///
/// Records with a blank body or blank text are dropped.
pub fn parse_corpus(json: &str) -> Result<Vec<Message>> {
    let records: Vec<SourceRecord> = serde_json::from_str(json)?;
    Ok(records
        .into_iter()
        .filter_map(SourceRecord::into_message)
        .collect())
}

/// Read and parse the corpus file.
pub async fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<Message>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).await.map_err(|e| {
        RetrievalError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })?;
    let messages = parse_corpus(&content)?;
    info!("Loaded {} messages from {}", messages.len(), path.display());
    Ok(messages)
}
