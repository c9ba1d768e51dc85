//! Startup sequence shared by the commands that answer questions

use anyhow::Result;
use std::sync::Arc;
use vidya_core::config::LayeredConfig;
use vidya_core::formats::ParserRegistry;
use vidya_core::CorpusScanner;
use vidya_llm::provider::{build_embedder, build_generator};
use vidya_llm::Embedder;
use vidya_retrieval::{ConversationSession, RetrievalEngine};
use vidya_store::{load_or_build, IndexOrigin, IndexStore, StartupOutcome};

use crate::cli::Cli;
use crate::output::OutputWriter;
use crate::progress::BuildProgress;

/// Resolve layered configuration for this invocation
pub fn resolve_config(cli: &Cli) -> Result<LayeredConfig> {
    let config = LayeredConfig::resolve(cli.config.as_deref(), cli.overrides())?;
    Ok(config)
}

pub fn scanner_for(config: &LayeredConfig) -> CorpusScanner {
    CorpusScanner::new(ParserRegistry::with_defaults(config.section_config()))
}

pub fn store_for(config: &LayeredConfig) -> IndexStore {
    IndexStore::new(config.index_path.value.clone())
}

/// Load the persisted index or build one, drawing progress as it goes
pub fn open_index(
    config: &LayeredConfig,
    embedder: &dyn Embedder,
    output: &OutputWriter,
) -> vidya_core::Result<StartupOutcome> {
    let store = store_for(config);
    let scanner = scanner_for(config);
    let mut progress = if output.is_json() { BuildProgress::hidden() } else { BuildProgress::new() };

    let outcome = load_or_build(
        &store,
        &scanner,
        &config.source_dir.value,
        embedder,
        |event| progress.update(event),
    );
    progress.finish(outcome.is_ok());

    let outcome = outcome?;
    report_origin(config, &outcome, output);
    Ok(outcome)
}

fn report_origin(config: &LayeredConfig, outcome: &StartupOutcome, output: &OutputWriter) {
    let units = outcome.index.as_ref().map(|index| index.len()).unwrap_or(0);
    let index_path = config.index_path.value.display();

    match outcome.origin {
        IndexOrigin::Loaded => {
            output.info(format!("Loaded index with {} units from {}", units, index_path))
        }
        IndexOrigin::Built => output.success(format!("Built index with {} units at {}", units, index_path)),
        IndexOrigin::EmptyCorpus => output.warning(format!(
            "No documents to index in {}. Add PDF, text or .xlsx files there and restart.",
            config.source_dir.value.display()
        )),
    }
}

/// Build a conversation session per the startup policy.
///
/// Only fatal errors abort. A missing or unreachable embedder leaves the
/// session unavailable so every question gets the fixed notice instead.
pub fn start_session(config: &LayeredConfig, output: &OutputWriter) -> Result<ConversationSession> {
    let generator = build_generator(&config.generator.value, config)?;

    let retrieval = match open_retrieval(config, output) {
        Ok(retrieval) => retrieval,
        Err(error) if error.is_fatal() => return Err(error.into()),
        Err(error) => {
            output.warning(&error);
            None
        }
    };

    Ok(ConversationSession::new(retrieval, generator, config.top_k.value))
}

fn open_retrieval(config: &LayeredConfig, output: &OutputWriter) -> vidya_core::Result<Option<RetrievalEngine>> {
    let embedder: Arc<dyn Embedder> = Arc::from(build_embedder(&config.embedder.value, config)?);

    let Some(index) = open_index(config, embedder.as_ref(), output)?.index else {
        return Ok(None);
    };

    RetrievalEngine::new(index, embedder).map(Some)
}

