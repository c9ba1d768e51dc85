//! Corpus scanning over a flat source directory

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::formats::{ParseOutcome, ParserRegistry};
use crate::models::Corpus;

/// What happened to one directory entry during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Parsed { format: String, units: usize },
    Unsupported { extension: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file_name: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Per-file outcome of a scan, in dispatch order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub files: Vec<FileReport>,

    /// Set when the source directory did not exist and was created
    pub created_dir: bool,
}

impl ScanReport {
    pub fn total_units(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Parsed { units, .. } => units,
                _ => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> usize {
        self.files.iter().filter(|f| !matches!(f.status, FileStatus::Parsed { .. })).count()
    }
}

/// Walks the top level of a source directory and dispatches every
/// regular file to the parser registry.
pub struct CorpusScanner {
    registry: ParserRegistry,
}

impl CorpusScanner {
    pub fn new(registry: ParserRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Scan `dir` into a corpus; a missing directory is created and yields nothing
    pub fn scan(&self, dir: &Path) -> Result<Corpus> {
        self.scan_with_report(dir).map(|(corpus, _)| corpus)
    }

    /// Scan `dir`, also returning what happened to each file
    pub fn scan_with_report(&self, dir: &Path) -> Result<(Corpus, ScanReport)> {
        let mut report = ScanReport::default();

        if !dir.exists() {
            fs::create_dir_all(dir)?;
            tracing::info!("Created source directory {}", dir.display());
            report.created_dir = true;
            return Ok((Corpus::new(), report));
        }

        let files = list_files(dir)?;
        if files.is_empty() {
            tracing::info!("No documents found in {}", dir.display());
        }

        let mut corpus = Corpus::new();
        for path in files {
            let file_name =
                path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

            let status = match self.registry.parse(&path) {
                ParseOutcome::Parsed(units) => {
                    let format = self
                        .registry
                        .detect(&path)
                        .map(|p| p.format_name().to_string())
                        .unwrap_or_default();
                    let count = units.len();
                    corpus.extend(units);
                    FileStatus::Parsed { format, units: count }
                }
                ParseOutcome::Unsupported { extension } => FileStatus::Unsupported { extension },
                ParseOutcome::Failed { reason } => FileStatus::Failed { reason },
            };

            report.files.push(FileReport { file_name, status });
        }

        tracing::info!(
            "Scanned {}: {} units from {} files ({} skipped)",
            dir.display(),
            corpus.len(),
            report.files.len(),
            report.skipped()
        );

        Ok((corpus, report))
    }
}

impl Default for CorpusScanner {
    fn default() -> Self {
        Self::new(ParserRegistry::default())
    }
}

/// Regular files directly inside `dir`, ordered by file name bytes
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        // Follows symlinks, so a link to a regular file counts
        if fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
            files.push(path);
        } else {
            tracing::debug!("Skipping non-file entry {}", path.display());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
