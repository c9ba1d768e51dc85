use vidya_core::error::{Result, VidyaError};
use vidya_core::Corpus;
use vidya_llm::Embedder;

use crate::index::SimilarityIndex;

/// Progress information for index building
#[derive(Debug, Clone)]
pub struct IndexProgress {
    pub phase: IndexPhase,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Current phase of index building
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPhase {
    Scanning,
    GeneratingEmbeddings,
    Saving,
}

/// Embeds a corpus into a [`SimilarityIndex`]
pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    batch_size: usize,
}

impl<'a> IndexBuilder<'a> {
    /// Create a new index builder
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder, batch_size: 32 }
    }

    /// Set the batch size for embedding generation
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Build an index, or `None` when the corpus has nothing to index
    pub fn build(&self, corpus: &Corpus) -> Result<Option<SimilarityIndex>> {
        self.build_with_progress(corpus, |_| {})
    }

    /// Build the index with progress reporting
    pub fn build_with_progress<F>(
        &self,
        corpus: &Corpus,
        mut progress: F,
    ) -> Result<Option<SimilarityIndex>>
    where
        F: FnMut(IndexProgress),
    {
        if corpus.is_empty() {
            tracing::info!("Corpus is empty; no index to build");
            return Ok(None);
        }

        let dimensions = self.embedder.dimensions();
        let mut index = SimilarityIndex::new(self.embedder.embedder_id(), dimensions);
        let total = corpus.len();

        tracing::info!(
            "Embedding {} units with '{}' in batches of {}",
            total,
            self.embedder.model_name(),
            self.batch_size
        );

        for batch in corpus.units().chunks(self.batch_size) {
            progress(IndexProgress {
                phase: IndexPhase::GeneratingEmbeddings,
                current: index.len(),
                total,
                message: format!("Embedding units {}-{}", index.len() + 1, index.len() + batch.len()),
            });

            let texts: Vec<&str> = batch.iter().map(|u| u.content()).collect();
            let vectors = self.embedder.embed(&texts)?;

            if vectors.len() != batch.len() {
                return Err(VidyaError::EmbedderUnavailable {
                    reason: format!(
                        "'{}' returned {} embeddings for {} inputs",
                        self.embedder.model_name(),
                        vectors.len(),
                        batch.len()
                    ),
                    remediation: "Retry the build; if it persists, switch embedder".to_string(),
                });
            }

            for (unit, vector) in batch.iter().zip(vectors) {
                index.push(unit.clone(), vector)?;
            }
        }

        progress(IndexProgress {
            phase: IndexPhase::GeneratingEmbeddings,
            current: total,
            total,
            message: "Embeddings complete".to_string(),
        });

        Ok(Some(index))
    }
}
