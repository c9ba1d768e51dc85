use anyhow::Result;
use serde::Serialize;
use vidya_llm::provider::build_embedder;
use vidya_store::IndexOrigin;

use crate::cli::{BuildArgs, Cli};
use crate::interactive::confirm_rebuild;
use crate::output::OutputWriter;
use crate::startup::{open_index, resolve_config, store_for};

#[derive(Debug, Serialize)]
struct BuildOutput {
    index_path: String,
    origin: &'static str,
    embedder: String,
    dimensions: usize,
    units: usize,
}

pub fn execute(cli: &Cli, args: &BuildArgs, output: &OutputWriter) -> Result<()> {
    let config = resolve_config(cli)?;
    let store = store_for(&config);

    // Connect to the embedder before deleting anything
    let embedder = build_embedder(&config.embedder.value, &config)?;

    if args.force && store.exists() {
        if !args.yes && !confirm_rebuild(store.path())? {
            output.info("Kept the existing index");
            return Ok(());
        }
        store.remove()?;
        output.info(format!("Removed index at {}", store.path().display()));
    }

    let outcome = open_index(&config, embedder.as_ref(), output)?;

    let origin = match outcome.origin {
        IndexOrigin::Loaded => "loaded",
        IndexOrigin::Built => "built",
        IndexOrigin::EmptyCorpus => "empty_corpus",
    };

    let build_output = BuildOutput {
        index_path: store.path().display().to_string(),
        origin,
        embedder: embedder.embedder_id(),
        dimensions: embedder.dimensions(),
        units: outcome.index.as_ref().map(|index| index.len()).unwrap_or(0),
    };

    if output.is_json() {
        output.result(build_output)?;
    } else {
        output.section("Index");
        output.kv("Location", &build_output.index_path);
        output.kv("Origin", build_output.origin);
        output.kv("Embedder", &build_output.embedder);
        output.kv("Dimensions", build_output.dimensions);
        output.kv("Units", build_output.units);

        if let IndexOrigin::Loaded = outcome.origin {
            output.info("An existing index is never rebuilt; use --force to rebuild from the source directory");
        }
    }

    Ok(())
}
