//! In-memory similarity index over embedded text units

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use vidya_core::error::{Result, VidyaError};
use vidya_core::TextUnit;
use vidya_llm::Embedder;

/// One indexed unit and its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub unit: TextUnit,
    pub vector: Vec<f32>,
}

/// A unit returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredUnit {
    pub unit: TextUnit,
    pub score: f32,
}

/// Nearest-neighbour index keeping units and vectors in 1:1 correspondence.
///
/// Read-only once built; every vector has exactly `dimensions` components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityIndex {
    embedder_model: String,
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl SimilarityIndex {
    /// Create an empty index for vectors produced by `embedder_model`
    pub fn new(embedder_model: impl Into<String>, dimensions: usize) -> Self {
        Self { embedder_model: embedder_model.into(), dimensions, entries: Vec::new() }
    }

    /// Add a unit with its vector
    pub fn push(&mut self, unit: TextUnit, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(VidyaError::DimensionMismatch {
                expected: self.dimensions,
                found: vector.len(),
            });
        }

        self.entries.push(IndexEntry { unit, vector });
        Ok(())
    }

    /// Top `k` units by cosine similarity, best first.
    ///
    /// Ties keep index order, so results are deterministic.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredUnit>> {
        if query.len() != self.dimensions {
            return Err(VidyaError::DimensionMismatch {
                expected: self.dimensions,
                found: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (idx, cosine_similarity(query, &entry.vector)))
            .collect();

        // Sort by score descending; sort_by is stable
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| ScoredUnit { unit: self.entries[idx].unit.clone(), score })
            .collect())
    }

    /// Check structural consistency of deserialized data
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.embedder_model.trim().is_empty() {
            return Err("index names no embedder model".to_string());
        }

        if self.dimensions == 0 {
            return Err("index has zero dimensions".to_string());
        }

        if self.entries.is_empty() {
            return Err("index has no entries".to_string());
        }

        if let Some((idx, entry)) =
            self.entries.iter().enumerate().find(|(_, e)| e.vector.len() != self.dimensions)
        {
            return Err(format!(
                "entry {} has {} components, expected {}",
                idx,
                entry.vector.len(),
                self.dimensions
            ));
        }

        if self.entries.iter().any(|e| e.vector.iter().any(|x| !x.is_finite())) {
            return Err("index contains non-finite vector components".to_string());
        }

        Ok(())
    }

    pub fn embedder_model(&self) -> &str {
        &self.embedder_model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Refuse queries from an embedder other than the one that built this index
    pub fn check_compatible(&self, embedder: &dyn Embedder) -> Result<()> {
        let id = embedder.embedder_id();
        if self.embedder_model != id || self.dimensions != embedder.dimensions() {
            return Err(VidyaError::IndexIncompatible {
                expected: format!("{} ({}d)", id, embedder.dimensions()),
                found: format!("{} ({}d)", self.embedder_model, self.dimensions),
                recorded: self.embedder_model.clone(),
            });
        }
        Ok(())
    }

    /// Whether `unit` is one of the indexed units
    pub fn contains(&self, unit: &TextUnit) -> bool {
        self.entries.iter().any(|e| &e.unit == unit)
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidya_core::models::{TxtUnitMeta, UnitMetadata};

    fn unit(name: &str, content: &str) -> TextUnit {
        TextUnit::new(content, UnitMetadata::Txt(TxtUnitMeta { source_file: name.to_string() }))
            .unwrap()
    }

    fn sample_index() -> SimilarityIndex {
        let mut index = SimilarityIndex::new("test-model", 2);
        index.push(unit("east.txt", "east"), vec![1.0, 0.0]).unwrap();
        index.push(unit("north.txt", "north"), vec![0.0, 1.0]).unwrap();
        index.push(unit("northeast.txt", "northeast"), vec![1.0, 1.0]).unwrap();
        index
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let results = sample_index().search(&[1.0, 0.1], 3).unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.unit.source_file()).collect();
        assert_eq!(names, vec!["east.txt", "northeast.txt", "north.txt"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_truncates_to_k() {
        let index = sample_index();
        assert_eq!(index.search(&[1.0, 1.0], 1).unwrap().len(), 1);
        assert_eq!(index.search(&[1.0, 1.0], 10).unwrap().len(), 3);
        assert!(index.search(&[1.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = SimilarityIndex::new("test-model", 2);
        index.push(unit("a.txt", "first"), vec![1.0, 0.0]).unwrap();
        index.push(unit("b.txt", "second"), vec![2.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].unit.source_file(), "a.txt");
        assert_eq!(results[1].unit.source_file(), "b.txt");
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(VidyaError::DimensionMismatch { expected: 2, found: 3 })
        ));
        assert!(index.push(unit("x.txt", "x"), vec![1.0]).is_err());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_validate() {
        assert!(sample_index().validate().is_ok());
        assert!(SimilarityIndex::new("m", 2).validate().is_err());

        let mut broken = sample_index();
        broken.entries[1].vector.push(0.5);
        assert!(broken.validate().unwrap_err().contains("entry 1"));

        let mut nan = sample_index();
        nan.entries[0].vector[0] = f32::NAN;
        assert!(nan.validate().is_err());
    }

    struct HostedEmbedder;

    impl Embedder for HostedEmbedder {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "nomic-embed-text"
        }

        fn embedder_id(&self) -> String {
            "ollama:nomic-embed-text".to_string()
        }
    }

    #[test]
    fn test_incompatible_index_reports_recorded_spec() {
        assert!(SimilarityIndex::new("ollama:nomic-embed-text", 2)
            .check_compatible(&HostedEmbedder)
            .is_ok());

        let err = SimilarityIndex::new("openai:text-embedding-3-small", 2)
            .check_compatible(&HostedEmbedder)
            .unwrap_err();
        match err {
            VidyaError::IndexIncompatible { recorded, .. } => {
                assert_eq!(recorded, "openai:text-embedding-3-small");
                assert!(recorded.parse::<vidya_core::config::ProviderSpec>().is_ok());
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(SimilarityIndex::new("ollama:nomic-embed-text", 3)
            .check_compatible(&HostedEmbedder)
            .is_err());
    }
}
