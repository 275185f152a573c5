//! Format detection and decoder dispatch.
//!
//! Detection works on the file name only:
//!
//! - `*.zip`        → [`VolumeFormat::Archive`]
//! - `*.mhd`        → [`VolumeFormat::MetaImage`]
//! - name has `.nii` → [`VolumeFormat::Nifti`]
//! - anything else  → [`VolumeFormat::Other`] (fallback reader)

use std::path::Path;

use tracing::debug;

use super::archive::{extract_archive, lower_extension, lower_name};
use super::external::{read_any, read_nifti};
use super::metaimage::read_metaimage;
use crate::error::FormatError;
use crate::volume::DecodedVolume;

// =============================================================================
// VolumeFormat
// =============================================================================

/// Source formats a scan file can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeFormat {
    /// ZIP container holding one of the other formats
    Archive,

    /// MetaImage header plus raw payload
    MetaImage,

    /// NIfTI-1, optionally gzip-compressed
    Nifti,

    /// Unrecognized name, handed to the fallback reader
    Other,
}

impl VolumeFormat {
    /// Classify a file by its name.
    pub fn detect(path: &Path) -> Self {
        match lower_extension(path).as_deref() {
            Some("zip") => VolumeFormat::Archive,
            Some("mhd") => VolumeFormat::MetaImage,
            _ if lower_name(path).contains(".nii") => VolumeFormat::Nifti,
            _ => VolumeFormat::Other,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            VolumeFormat::Archive => "ZIP archive",
            VolumeFormat::MetaImage => "MetaImage",
            VolumeFormat::Nifti => "NIfTI",
            VolumeFormat::Other => "other",
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode the volume stored at `path`.
///
/// Archives are unpacked and the selected inner file is decoded in turn; the
/// scratch directory lives until the inner decode returns.
pub fn decode_file(path: &Path) -> Result<DecodedVolume, FormatError> {
    let format = VolumeFormat::detect(path);
    debug!(path = %path.display(), format = format.name(), "Decoding volume file");

    match format {
        VolumeFormat::Archive => {
            let extracted = extract_archive(path)?;
            if VolumeFormat::detect(extracted.selected()) == VolumeFormat::Archive {
                return Err(FormatError::UnsupportedFormat {
                    reason: "nested archives are not supported".to_string(),
                });
            }
            decode_file(extracted.selected())
        }
        VolumeFormat::MetaImage => read_metaimage(path),
        VolumeFormat::Nifti => read_nifti(path),
        VolumeFormat::Other => read_any(path),
    }
}
