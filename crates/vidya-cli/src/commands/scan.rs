use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use vidya_core::scanner::FileStatus;

use crate::cli::Cli;
use crate::output::OutputWriter;
use crate::startup::{resolve_config, scanner_for};

#[derive(Debug, Serialize, Tabled)]
struct ScanRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Units")]
    units: usize,
    #[tabled(rename = "Note")]
    note: String,
}

/// Parse every document without embedding and report per file
pub fn execute(cli: &Cli, output: &OutputWriter) -> Result<()> {
    let config = resolve_config(cli)?;
    let source_dir = &config.source_dir.value;

    let (corpus, report) = scanner_for(&config).scan_with_report(source_dir)?;

    if output.is_json() {
        return output.result(&report);
    }

    if report.created_dir {
        output.warning(format!("Created empty source directory {}", source_dir.display()));
    }

    let rows = report
        .files
        .iter()
        .map(|file| {
            let (format, units, note) = match &file.status {
                FileStatus::Parsed { format, units } => (format.clone(), *units, String::new()),
                FileStatus::Unsupported { extension } => {
                    ("-".to_string(), 0, format!("unsupported extension '{}'", extension))
                }
                FileStatus::Failed { reason } => ("-".to_string(), 0, format!("failed: {}", reason)),
            };
            ScanRow { file: file.file_name.clone(), format, units, note }
        })
        .collect();

    output.section(format!("Documents in {}", source_dir.display()));
    output.table(rows)?;
    output.kv("Units", corpus.len());
    output.kv("Skipped files", report.skipped());

    Ok(())
}
