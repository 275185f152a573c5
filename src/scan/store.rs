//! Scan storage collaborator.
//!
//! A scan lives in its own directory under a data root. Its CT source file is
//! the single file whose name starts with a fixed prefix (by default
//! `ct_original_`), e.g. `data/scans/<scan_id>/ct_original_chest.zip`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::error::IoError;

/// Default prefix of a scan's source file.
pub const DEFAULT_SOURCE_PREFIX: &str = "ct_original_";

/// Storage lookups the loader depends on.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Whether a scan with this identifier exists.
    async fn scan_exists(&self, scan_id: &str) -> Result<bool, IoError>;

    /// Path of the scan's CT source file, if one is present.
    async fn find_source_file(&self, scan_id: &str) -> Result<Option<PathBuf>, IoError>;
}

/// Scans stored as directories on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalScanStore {
    root: PathBuf,
    prefix: String,
}

impl LocalScanStore {
    /// Create a store rooted at `root` using the default source prefix.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_prefix(root, DEFAULT_SOURCE_PREFIX)
    }

    pub fn with_prefix(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scan_dir(&self, scan_id: &str) -> PathBuf {
        self.root.join(scan_id)
    }
}

#[async_trait]
impl ScanStore for LocalScanStore {
    async fn scan_exists(&self, scan_id: &str) -> Result<bool, IoError> {
        match tokio::fs::metadata(self.scan_dir(scan_id)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_source_file(&self, scan_id: &str) -> Result<Option<PathBuf>, IoError> {
        let mut entries = match tokio::fs::read_dir(self.scan_dir(scan_id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut matches = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&self.prefix) && entry.file_type().await?.is_file()
            {
                matches.push(entry.path());
            }
        }

        matches.sort();
        if matches.len() > 1 {
            warn!(
                scan_id,
                count = matches.len(),
                using = %matches[0].display(),
                "Multiple CT source files found"
            );
        }

        Ok(matches.into_iter().next())
    }
}
