//! Vidya Store - Similarity index and its persistence
//!
//! This crate embeds a corpus into a similarity index, persists it with an
//! integrity manifest and applies the load-before-build startup policy.

pub mod builder;
pub mod index;
pub mod persist;
pub mod startup;

pub use builder::{IndexBuilder, IndexPhase, IndexProgress};
pub use index::{IndexEntry, ScoredUnit, SimilarityIndex};
pub use persist::{IndexManifest, IndexStore};
pub use startup::{load_or_build, IndexOrigin, StartupOutcome};
