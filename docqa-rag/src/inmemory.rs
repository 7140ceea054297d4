//! In-memory index using cosine similarity.
//!
//! This module provides [`InMemoryIndex`], an index backed by a `Vec`
//! protected by a `tokio::sync::RwLock`. Records are embedded on insert
//! through an [`EmbeddingProvider`]. The whole index can be written to and
//! read back from a JSON snapshot so that ingestion and querying can run in
//! separate processes.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::Record;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{Index, SearchMode};

const BACKEND: &str = "InMemory";

/// Trade-off between relevance (1.0) and diversity (0.0) for MMR.
const MMR_LAMBDA: f32 = 0.5;

/// Minimum candidate pool considered by MMR before re-ranking.
const MMR_MIN_FETCH: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    record: Record,
    embedding: Vec<f32>,
}

/// An in-memory [`Index`] using cosine similarity for retrieval.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Index, InMemoryIndex, SearchMode};
///
/// let index = InMemoryIndex::new(Arc::new(embedder)).with_similarity_threshold(0.3);
/// index.add_batch(&records).await?;
/// index.save("vector_db/index.json").await?;
/// ```
pub struct InMemoryIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    similarity_threshold: f32,
    records: RwLock<Vec<StoredRecord>>,
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex")
            .field("similarity_threshold", &self.similarity_threshold)
            .finish_non_exhaustive()
    }
}

impl InMemoryIndex {
    /// Create an empty index.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder, similarity_threshold: 0.0, records: RwLock::new(Vec::new()) }
    }

    /// Set the minimum score used by [`SearchMode::SimilarityScoreThreshold`].
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the index holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// A copy of every stored record, in insertion order.
    pub async fn records(&self) -> Vec<Record> {
        self.records.read().await.iter().map(|stored| stored.record.clone()).collect()
    }

    /// Write the index (records and embeddings) to a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IoError`] if the file cannot be written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let records = self.records.read().await;
        let json = serde_json::to_vec(&*records).map_err(|e| index_error(format!("{e}")))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        info!(path = %path.display(), record_count = records.len(), "saved index snapshot");
        Ok(())
    }

    /// Read an index previously written by [`save`](InMemoryIndex::save).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if the snapshot does not exist,
    /// [`RagError::IndexError`] if it cannot be parsed, and
    /// [`RagError::InvalidConfig`] if its embeddings do not match the
    /// provider's dimensionality.
    pub async fn load(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            return Err(RagError::NotFound(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path).await?;
        let records: Vec<StoredRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| index_error(format!("invalid snapshot '{}': {e}", path.display())))?;

        let expected = embedder.dimensions();
        if let Some(stored) = records.iter().find(|stored| stored.embedding.len() != expected) {
            return Err(RagError::InvalidConfig(format!(
                "snapshot embeddings have {} dimensions but the provider produces {expected}",
                stored.embedding.len()
            )));
        }

        info!(path = %path.display(), record_count = records.len(), "loaded index snapshot");
        Ok(Self { embedder, similarity_threshold: 0.0, records: RwLock::new(records) })
    }
}

fn index_error(message: String) -> RagError {
    RagError::IndexError { backend: BACKEND.to_string(), message }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn by_score_desc(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal)
}

/// Greedy MMR selection over `candidates` (index into `stored`, query score).
fn select_mmr(stored: &[StoredRecord], candidates: &[(usize, f32)], top_k: usize) -> Vec<usize> {
    let mut remaining = candidates.to_vec();
    let mut selected: Vec<usize> = Vec::with_capacity(top_k.min(candidates.len()));

    while selected.len() < top_k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (pos, (idx, relevance)) in remaining.iter().enumerate() {
            let candidate = &stored[*idx].embedding;
            let redundancy = selected
                .iter()
                .map(|chosen| cosine_similarity(candidate, &stored[*chosen].embedding))
                .fold(0.0_f32, f32::max);
            let score = MMR_LAMBDA * relevance - (1.0 - MMR_LAMBDA) * redundancy;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }
        selected.push(remaining.remove(best_pos).0);
    }

    selected
}

#[async_trait]
impl Index for InMemoryIndex {
    async fn add(&self, record: Record) -> Result<()> {
        let embedding = self.embedder.embed(&record.content).await?;
        self.records.write().await.push(StoredRecord { record, embedding });
        Ok(())
    }

    async fn add_batch(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let texts: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != records.len() {
            return Err(index_error(format!(
                "embedding provider returned {} vectors for {} records",
                embeddings.len(),
                records.len()
            )));
        }

        let mut store = self.records.write().await;
        store.extend(
            records
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(record, embedding)| StoredRecord { record, embedding }),
        );
        debug!(added = records.len(), total = store.len(), "records added to index");
        Ok(())
    }

    async fn retrieve(&self, query: &str, top_k: usize, mode: SearchMode) -> Result<Vec<Record>> {
        let query_embedding = self.embedder.embed(query).await?;
        let store = self.records.read().await;

        let mut scored: Vec<(usize, f32)> = store
            .iter()
            .enumerate()
            .map(|(idx, stored)| (idx, cosine_similarity(&stored.embedding, &query_embedding)))
            .collect();
        scored.sort_by(by_score_desc);

        let selected: Vec<usize> = match mode {
            SearchMode::Similarity => scored.iter().take(top_k).map(|(idx, _)| *idx).collect(),
            SearchMode::SimilarityScoreThreshold => scored
                .iter()
                .filter(|(_, score)| *score >= self.similarity_threshold)
                .take(top_k)
                .map(|(idx, _)| *idx)
                .collect(),
            SearchMode::Mmr => {
                scored.truncate(top_k.saturating_mul(4).max(MMR_MIN_FETCH));
                select_mmr(&store, &scored, top_k)
            }
        };

        debug!(%mode, top_k, result_count = selected.len(), "index retrieval completed");
        Ok(selected.into_iter().map(|idx| store[idx].record.clone()).collect())
    }
}
