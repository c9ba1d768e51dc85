use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::Cli;
use crate::output::OutputWriter;
use crate::startup::resolve_config;

#[derive(Debug, Serialize, Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

/// Effective configuration with the layer each value came from
pub fn execute(cli: &Cli, output: &OutputWriter) -> Result<()> {
    let config = resolve_config(cli)?;

    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: source.to_string() })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    output.section("Configuration");
    output.table(rows)
}
