//! Status command implementation

use anyhow::Result;
use serde::Serialize;
use vidya_store::IndexManifest;

use crate::cli::Cli;
use crate::output::OutputWriter;
use crate::startup::{resolve_config, store_for};

#[derive(Debug, Serialize)]
struct StatusOutput {
    source_dir: String,
    index_path: String,
    embedder: String,
    built: bool,
    manifest: Option<IndexManifest>,
}

pub fn execute(cli: &Cli, output: &OutputWriter) -> Result<()> {
    let config = resolve_config(cli)?;
    let store = store_for(&config);

    // Reading the manifest does not verify the checksum; `build` does
    let manifest = store.manifest()?;

    if output.is_json() {
        return output.result(StatusOutput {
            source_dir: config.source_dir.value.display().to_string(),
            index_path: store.path().display().to_string(),
            embedder: config.embedder.value.to_string(),
            built: manifest.is_some(),
            manifest,
        });
    }

    output.section("Index Status");
    output.kv("Location", store.path().display());

    let Some(manifest) = manifest else {
        output.kv("Status", "Not built");
        output.info(format!(
            "The index is built on the next start from documents in {}",
            config.source_dir.value.display()
        ));
        return Ok(());
    };

    output.kv("Status", "Built");
    output.kv("Built At", manifest.built_at.format("%Y-%m-%d %H:%M:%S UTC"));
    output.kv("Embedder", &manifest.embedder_model);
    output.kv("Dimensions", manifest.dimensions);
    output.kv("Units", manifest.unit_count);
    output.kv("Format Version", manifest.format_version);
    output.kv("Checksum", &manifest.checksum[..manifest.checksum.len().min(12)]);

    if manifest.embedder_model != config.embedder.value.to_string() {
        output.warning(format!(
            "Configured embedder '{}' differs from the one this index was built with",
            config.embedder.value
        ));
    }

    Ok(())
}
