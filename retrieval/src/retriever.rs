//! Brute-force similarity ranking over the vector store.
//!
//! Corpora are small, so every query is compared against every stored
//! vector. Ranking keeps the top K by cosine similarity; the relevance
//! threshold is applied afterwards and only decides which ranked entries
//! become snippets.

use std::cmp::Reverse;

use askwhy_embeddings::{Embedding, cosine_similarity, ensure_dimension};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RetrievalError};
use crate::store::VectorStore;

/// Position of a stored entry and its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub index: usize,
    pub score: f32,
}

/// A ranked entry that passed the relevance threshold, ready for citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub index: usize,
    pub text: String,
    pub timestamp: String,
    pub side: String,
    pub score: f32,
}

/// Output of a retrieval: the full top-K plus the snippets above threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieval {
    pub ranked: Vec<Ranked>,
    pub snippets: Vec<Snippet>,
}

/// Rank `corpus` by cosine similarity to `query` and keep the best `k`.
///
/// Ties keep insertion order. Every dimension is checked before any score
/// is computed.
pub fn rank(query: &[f32], corpus: &[Embedding], k: usize) -> Result<Vec<Ranked>> {
    let Some(first) = corpus.first() else {
        return Err(RetrievalError::StoreUnavailable);
    };
    let dimension = first.len();
    ensure_dimension(dimension, query)?;
    for embedding in corpus {
        ensure_dimension(dimension, embedding)?;
    }

    let mut ranked = corpus
        .iter()
        .enumerate()
        .map(|(index, embedding)| {
            let score = cosine_similarity(query, embedding)?;
            Ok(Ranked {
                index,
                // NaN would otherwise sort above every real score.
                score: if score.is_finite() {
                    score
                } else {
                    f32::NEG_INFINITY
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // `sort_by_key` is stable, which is what keeps ties in insertion order.
    ranked.sort_by_key(|r| Reverse(OrderedFloat(r.score)));
    ranked.truncate(k);

    Ok(ranked)
}

/// Keep the ranked entries whose score reaches `threshold`.
pub fn filter_relevant(ranked: &[Ranked], threshold: f32) -> Vec<Ranked> {
    ranked
        .iter()
        .copied()
        .filter(|r| r.score >= threshold)
        .collect()
}

/// Rank the store against `query` and attach citation data to the entries
/// above `threshold`.
pub fn retrieve(
    query: &[f32],
    store: &VectorStore,
    k: usize,
    threshold: f32,
) -> Result<Retrieval> {
    let ranked = rank(query, store.embeddings(), k)?;

    let snippets: Vec<Snippet> = filter_relevant(&ranked, threshold)
        .into_iter()
        .filter_map(|r| {
            let entry = store.entry(r.index)?;
            Some(Snippet {
                index: r.index,
                text: entry.text.to_string(),
                timestamp: entry.metadata.timestamp.clone(),
                side: entry.metadata.side.clone(),
                score: r.score,
            })
        })
        .collect();

    debug!(
        "Ranked {} entries, {} above threshold {threshold}",
        ranked.len(),
        snippets.len()
    );

    Ok(Retrieval { ranked, snippets })
}
