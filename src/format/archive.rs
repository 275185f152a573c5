//! ZIP archive extraction.
//!
//! An archive is unpacked into a [`TempDir`] owned by the returned
//! [`ExtractedArchive`]. Dropping that value deletes the directory, so the
//! scratch space is released on every exit path of the caller.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{FormatError, IoError};

/// Extensions considered when picking a volume out of an archive.
pub const CANDIDATE_EXTENSIONS: [&str; 4] = ["nii", "gz", "mhd", "nrrd"];

/// An unpacked archive and the volume file chosen from it.
#[derive(Debug)]
pub struct ExtractedArchive {
    dir: TempDir,
    selected: PathBuf,
}

impl ExtractedArchive {
    /// Path of the chosen volume file inside the scratch directory.
    pub fn selected(&self) -> &Path {
        &self.selected
    }

    /// Root of the scratch directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Unpack `archive_path` and select the best volume file inside it.
pub fn extract_archive(archive_path: &Path) -> Result<ExtractedArchive, FormatError> {
    let dir = tempfile::Builder::new()
        .prefix("ct-archive-")
        .tempdir()
        .map_err(IoError::from)?;

    debug!(
        archive = %archive_path.display(),
        scratch = %dir.path().display(),
        "Extracting archive"
    );

    let file = File::open(archive_path).map_err(IoError::from)?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| {
        FormatError::UnsupportedFormat {
            reason: format!("not a readable ZIP archive: {}", e),
        }
    })?;
    archive.extract(dir.path()).map_err(|e| match e {
        zip::result::ZipError::Io(io) => FormatError::Io(IoError::from(io)),
        other => FormatError::Decode(format!("ZIP extraction failed: {}", other)),
    })?;

    let mut candidates = Vec::new();
    collect_candidates(dir.path(), &mut candidates)?;
    candidates.sort();

    let selected = select_candidate(&candidates).ok_or_else(|| FormatError::UnsupportedFormat {
        reason: "No supported image file (.nii, .mhd, .nrrd) in ZIP".to_string(),
    })?;

    debug!(
        candidates = candidates.len(),
        selected = %selected.display(),
        "Selected volume file from archive"
    );

    Ok(ExtractedArchive { dir, selected })
}

/// Pick a file: `.mhd` first, then anything named `*.nii*`, then the rest.
pub fn select_candidate(candidates: &[PathBuf]) -> Option<PathBuf> {
    let by_extension = |ext: &str| {
        candidates
            .iter()
            .find(|p| lower_extension(p).as_deref() == Some(ext))
    };
    let by_name = |needle: &str| candidates.iter().find(|p| lower_name(p).contains(needle));

    by_extension("mhd")
        .or_else(|| by_name(".nii"))
        .or_else(|| candidates.first())
        .cloned()
}

fn collect_candidates(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), FormatError> {
    for entry in std::fs::read_dir(dir).map_err(IoError::from)? {
        let path = entry.map_err(IoError::from)?.path();
        if path.is_dir() {
            collect_candidates(&path, out)?;
        } else if lower_extension(&path)
            .map(|ext| CANDIDATE_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
    Ok(())
}

pub(crate) fn lower_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

pub(crate) fn lower_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}
