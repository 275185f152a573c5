//! Volume loading: scan lookup, format dispatch, normalization.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::error::VolumeError;
use crate::format::decode_file;
use crate::volume::Volume;

use super::store::ScanStore;

/// Produces a decoded [`Volume`] for a scan identifier.
///
/// [`super::VolumeCache`] is generic over this trait so tests can substitute
/// counting or failing loaders.
#[async_trait]
pub trait VolumeLoader: Send + Sync {
    async fn load(&self, scan_id: &str) -> Result<Volume, VolumeError>;
}

/// Reject identifiers that could escape the data root.
pub fn validate_scan_id(scan_id: &str) -> Result<(), VolumeError> {
    if scan_id.is_empty() {
        return Err(VolumeError::validation("Scan id must not be empty"));
    }
    if scan_id.contains('/') || scan_id.contains('\\') || scan_id.contains("..") {
        return Err(VolumeError::validation(format!(
            "Invalid scan id '{}'",
            scan_id
        )));
    }
    Ok(())
}

/// Loads volumes from scans held in a [`ScanStore`].
pub struct ScanLoader<S: ScanStore> {
    store: S,
}

impl<S: ScanStore> ScanLoader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn locate(&self, scan_id: &str) -> Result<PathBuf, VolumeError> {
        validate_scan_id(scan_id)?;

        if !self.store.scan_exists(scan_id).await? {
            return Err(VolumeError::not_found("Scan"));
        }

        self.store
            .find_source_file(scan_id)
            .await?
            .ok_or_else(|| VolumeError::not_found("CT file"))
    }
}

#[async_trait]
impl<S: ScanStore> VolumeLoader for ScanLoader<S> {
    async fn load(&self, scan_id: &str) -> Result<Volume, VolumeError> {
        let path = self.locate(scan_id).await?;
        debug!(scan_id, path = %path.display(), "Loading CT volume");

        let started = Instant::now();
        let decode_path = path.clone();
        let decoded = tokio::task::spawn_blocking(move || decode_file(&decode_path))
            .await
            .map_err(|e| VolumeError::internal(format!("decode task failed: {}", e)))?
            .map_err(VolumeError::from);

        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                if let VolumeError::Internal { message } = &e {
                    error!(scan_id, path = %path.display(), detail = %message, "Failed to load CT data");
                }
                return Err(e);
            }
        };

        let volume = Volume::new(decoded);
        info!(
            scan_id,
            dimensions = ?volume.dimensions(),
            element_type = volume.element_type().name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded CT volume"
        );

        Ok(volume)
    }
}
