//! On-disk persistence for the similarity index
//!
//! An index directory holds two files: `index.json` with the units and their
//! vectors, and `manifest.json` describing it. The manifest carries a SHA-256
//! checksum of `index.json`; loading refuses data that does not match it, or
//! that was built with an embedder other than the one configured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use vidya_core::error::{Result, VidyaError};
use vidya_llm::Embedder;

use crate::index::SimilarityIndex;

pub const INDEX_FILE: &str = "index.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Bumped whenever the persisted layout changes
pub const FORMAT_VERSION: u32 = 1;

/// Description of a persisted index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub embedder_model: String,
    pub dimensions: usize,
    pub unit_count: usize,
    pub built_at: DateTime<Utc>,

    /// Lowercase hex SHA-256 of `index.json`
    pub checksum: String,
}

/// Reads and writes one persisted index directory wholesale
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn index_file(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn manifest_file(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn staged(&self, file: &str) -> PathBuf {
        self.dir.join(format!("{}.tmp", file))
    }

    /// Finish a save that stopped between swapping in `index.json` and the
    /// manifest. The staged manifest is only promoted if it describes the
    /// index file now on disk.
    fn recover_interrupted_save(&self) -> Result<()> {
        let staged_manifest = self.staged(MANIFEST_FILE);
        if !staged_manifest.exists() || self.staged(INDEX_FILE).exists() || !self.index_file().exists()
        {
            return Ok(());
        }

        let Ok(content) = fs::read_to_string(&staged_manifest) else {
            return Ok(());
        };
        let Ok(manifest) = serde_json::from_str::<IndexManifest>(&content) else {
            return Ok(());
        };

        if manifest.checksum == sha256_hex(&fs::read(self.index_file())?) {
            fs::rename(&staged_manifest, self.manifest_file())?;
            tracing::warn!("Completed an interrupted save in {}", self.dir.display());
        }

        Ok(())
    }

    fn corrupted(&self, reason: impl Into<String>) -> VidyaError {
        VidyaError::IndexCorrupted { path: self.dir.clone(), reason: reason.into() }
    }

    /// Whether anything has been persisted here, even partially
    pub fn exists(&self) -> bool {
        self.index_file().exists() || self.manifest_file().exists()
    }

    /// Read the manifest, or `None` when no index is persisted
    pub fn manifest(&self) -> Result<Option<IndexManifest>> {
        if !self.exists() {
            return Ok(None);
        }

        self.recover_interrupted_save()?;

        let path = self.manifest_file();
        let content = fs::read_to_string(&path)
            .map_err(|e| self.corrupted(format!("cannot read {}: {}", MANIFEST_FILE, e)))?;

        let manifest: IndexManifest = serde_json::from_str(&content)
            .map_err(|e| self.corrupted(format!("invalid {}: {}", MANIFEST_FILE, e)))?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(self.corrupted(format!(
                "format version {} is not supported (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }

        Ok(Some(manifest))
    }

    /// Load the persisted index after verifying its integrity.
    ///
    /// Returns `None` when nothing is persisted. Any checksum, parse or
    /// consistency failure is `IndexCorrupted`.
    pub fn load(&self) -> Result<Option<SimilarityIndex>> {
        let Some(manifest) = self.manifest()? else {
            return Ok(None);
        };

        let bytes = fs::read(self.index_file())
            .map_err(|e| self.corrupted(format!("cannot read {}: {}", INDEX_FILE, e)))?;

        let checksum = sha256_hex(&bytes);
        if checksum != manifest.checksum {
            return Err(self.corrupted(format!(
                "checksum mismatch (manifest {}, file {})",
                manifest.checksum, checksum
            )));
        }

        let index: SimilarityIndex = serde_json::from_slice(&bytes)
            .map_err(|e| self.corrupted(format!("invalid {}: {}", INDEX_FILE, e)))?;

        index.validate().map_err(|reason| self.corrupted(reason))?;

        if index.len() != manifest.unit_count
            || index.dimensions() != manifest.dimensions
            || index.embedder_model() != manifest.embedder_model
        {
            return Err(self.corrupted("index contents disagree with the manifest"));
        }

        tracing::info!(
            "Loaded index from {} ({} units, {})",
            self.dir.display(),
            index.len(),
            index.embedder_model()
        );

        Ok(Some(index))
    }

    /// Load the persisted index, refusing one built by a different embedder
    pub fn load_for(&self, embedder: &dyn Embedder) -> Result<Option<SimilarityIndex>> {
        let Some(index) = self.load()? else {
            return Ok(None);
        };

        index.check_compatible(embedder)?;
        Ok(Some(index))
    }

    /// Persist `index`, replacing whatever was stored before
    pub fn save(&self, index: &SimilarityIndex) -> Result<IndexManifest> {
        fs::create_dir_all(&self.dir)?;

        let bytes = serde_json::to_vec(index)?;
        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            embedder_model: index.embedder_model().to_string(),
            dimensions: index.dimensions(),
            unit_count: index.len(),
            built_at: Utc::now(),
            checksum: sha256_hex(&bytes),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

        // Stage both files durably, then swap them in with the manifest last
        let index_tmp = self.staged(INDEX_FILE);
        let manifest_tmp = self.staged(MANIFEST_FILE);
        write_synced(&index_tmp, &bytes)?;
        write_synced(&manifest_tmp, &manifest_bytes)?;
        fs::rename(&index_tmp, self.index_file())?;
        fs::rename(&manifest_tmp, self.manifest_file())?;

        tracing::info!("Saved index to {} ({} units)", self.dir.display(), manifest.unit_count);
        Ok(manifest)
    }

    /// Delete the persisted index; returns whether anything was removed.
    ///
    /// Only files this store writes are touched. The directory itself goes
    /// only when nothing else is left in it.
    pub fn remove(&self) -> Result<bool> {
        let owned = [
            self.index_file(),
            self.manifest_file(),
            self.staged(INDEX_FILE),
            self.staged(MANIFEST_FILE),
        ];

        let mut removed = false;
        for path in owned.iter().filter(|p| p.is_file()) {
            fs::remove_file(path)?;
            removed = true;
        }

        if removed && fs::read_dir(&self.dir)?.next().is_none() {
            // The working directory cannot be removed; that is fine
            if let Err(e) = fs::remove_dir(&self.dir) {
                tracing::debug!("Left empty index directory {}: {}", self.dir.display(), e);
            }
        }

        if removed {
            tracing::info!("Removed index at {}", self.dir.display());
        }
        Ok(removed)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
