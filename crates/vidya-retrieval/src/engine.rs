use std::sync::Arc;
use vidya_core::error::{Result, VidyaError};
use vidya_llm::Embedder;
use vidya_store::{ScoredUnit, SimilarityIndex};

/// Answers top-k similarity queries against a loaded index
pub struct RetrievalEngine {
    index: SimilarityIndex,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalEngine {
    /// Pair an index with the embedder used for queries.
    ///
    /// The embedder must be the one the index was built with.
    pub fn new(index: SimilarityIndex, embedder: Arc<dyn Embedder>) -> Result<Self> {
        index.check_compatible(embedder.as_ref())?;
        Ok(Self { index, embedder })
    }

    /// Up to `k` units most similar to `query`, best first
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredUnit>> {
        let mut vectors = self.embedder.embed(&[query])?;
        let query_vector = vectors.pop().ok_or_else(|| VidyaError::EmbedderUnavailable {
            reason: format!("'{}' returned no embedding for the query", self.embedder.model_name()),
            remediation: "Retry the question".to_string(),
        })?;

        let results = self.index.search(&query_vector, k)?;
        tracing::debug!("Retrieved {} units for query ({} requested)", results.len(), k);
        Ok(results)
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }
}
