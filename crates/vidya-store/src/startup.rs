//! Startup policy: a persisted index always wins over rebuilding

use std::path::Path;
use vidya_core::error::Result;
use vidya_core::scanner::CorpusScanner;
use vidya_llm::Embedder;

use crate::builder::{IndexBuilder, IndexPhase, IndexProgress};
use crate::index::SimilarityIndex;
use crate::persist::IndexStore;

/// How the index available to this process came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    /// Read from disk; the source directory was not looked at
    Loaded,

    /// Built from the source directory and saved
    Built,

    /// The source directory yielded no units, so there is no index
    EmptyCorpus,
}

#[derive(Debug)]
pub struct StartupOutcome {
    pub index: Option<SimilarityIndex>,
    pub origin: IndexOrigin,
}

/// Load the persisted index, or scan, build and save one.
///
/// An existing index is never rebuilt, even if the documents changed since.
/// Corrupted or incompatible persisted data is returned as an error rather
/// than silently replaced.
pub fn load_or_build<F>(
    store: &IndexStore,
    scanner: &CorpusScanner,
    source_dir: &Path,
    embedder: &dyn Embedder,
    mut progress: F,
) -> Result<StartupOutcome>
where
    F: FnMut(IndexProgress),
{
    if let Some(index) = store.load_for(embedder)? {
        return Ok(StartupOutcome { index: Some(index), origin: IndexOrigin::Loaded });
    }

    tracing::info!("No index at {}; building from {}", store.path().display(), source_dir.display());

    progress(IndexProgress {
        phase: IndexPhase::Scanning,
        current: 0,
        total: 0,
        message: format!("Scanning {}", source_dir.display()),
    });

    let corpus = scanner.scan(source_dir)?;

    let Some(index) = IndexBuilder::new(embedder).build_with_progress(&corpus, &mut progress)?
    else {
        return Ok(StartupOutcome { index: None, origin: IndexOrigin::EmptyCorpus });
    };

    progress(IndexProgress {
        phase: IndexPhase::Saving,
        current: 0,
        total: 1,
        message: format!("Saving index to {}", store.path().display()),
    });

    store.save(&index)?;

    Ok(StartupOutcome { index: Some(index), origin: IndexOrigin::Built })
}
