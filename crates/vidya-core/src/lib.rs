//! Vidya Core - Document model, parsers, corpus scanning and configuration
//!
//! This crate turns a directory of PDF, plain text and spreadsheet files into
//! an ordered corpus of provenance-tagged text units. It has no knowledge of
//! embeddings or generation; those live in the crates layered above it.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod processing;
pub mod scanner;

pub use error::{Result, VidyaError};
pub use models::{Corpus, FileType, TextUnit, UnitMetadata};
pub use scanner::CorpusScanner;
