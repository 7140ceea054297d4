//! Index capability: store records, retrieve them ranked for a query.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::Record;
use crate::error::{RagError, Result};

/// How an [`Index`] ranks candidates for a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Top-k by similarity.
    #[default]
    Similarity,
    /// Top-k by similarity, dropping results below the configured threshold.
    SimilarityScoreThreshold,
    /// Maximal marginal relevance: relevant but mutually diverse results.
    Mmr,
}

impl SearchMode {
    /// The configuration spelling of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Similarity => "similarity",
            SearchMode::SimilarityScoreThreshold => "similarity_score_threshold",
            SearchMode::Mmr => "mmr",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "similarity" => Ok(SearchMode::Similarity),
            "similarity_score_threshold" => Ok(SearchMode::SimilarityScoreThreshold),
            "mmr" => Ok(SearchMode::Mmr),
            other => Err(RagError::InvalidConfig(format!(
                "invalid search mode '{other}', expected one of: similarity, \
                 similarity_score_threshold, mmr"
            ))),
        }
    }
}

/// A storage backend for records with similarity retrieval.
///
/// Implementations must be safe to call concurrently; the pipelines add no
/// locking of their own.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Index, InMemoryIndex, SearchMode};
///
/// let index = InMemoryIndex::new(embedder);
/// index.add_batch(&records).await?;
/// let ranked = index.retrieve("what changed in Q3?", 5, SearchMode::Mmr).await?;
/// ```
#[async_trait]
pub trait Index: Send + Sync {
    /// Store one record.
    async fn add(&self, record: Record) -> Result<()>;

    /// Store several records.
    ///
    /// The default implementation calls [`add`](Index::add) for each record in order.
    async fn add_batch(&self, records: &[Record]) -> Result<()> {
        for record in records {
            self.add(record.clone()).await?;
        }
        Ok(())
    }

    /// Return at most `top_k` records for `query`, most relevant first.
    async fn retrieve(&self, query: &str, top_k: usize, mode: SearchMode) -> Result<Vec<Record>>;
}
