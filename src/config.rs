//! Configuration management for the CT slicer.
//!
//! Settings come from command-line arguments, environment variables with the
//! `CT_` prefix, and defaults, in that order of precedence.
//!
//! # Environment Variables
//!
//! - `CT_DATA_DIR` - Root directory holding one sub-directory per scan (default: data/scans)
//! - `CT_SOURCE_PREFIX` - File name prefix of a scan's CT source file (default: ct_original_)
//! - `CT_CACHE_VOLUMES` - Max decoded volumes kept in memory (default: 2)
//! - `CT_JPEG_QUALITY` - JPEG quality for slices (default: 85)
//! - `CT_CACHE_MAX_AGE` - Cache-Control max-age for slices, seconds (default: 3600)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::scan::{DEFAULT_SOURCE_PREFIX, DEFAULT_VOLUME_CACHE_CAPACITY};
use crate::slice::{is_valid_quality, DEFAULT_CACHE_MAX_AGE, DEFAULT_JPEG_QUALITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default scan data root.
pub const DEFAULT_DATA_DIR: &str = "data/scans";

// =============================================================================
// CLI Arguments
// =============================================================================

/// CT slicer - decode CT volumes and render windowed slices.
#[derive(Parser, Debug, Clone)]
#[command(name = "ct-slicer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Directory containing one sub-directory per scan.
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR, env = "CT_DATA_DIR")]
    pub data_dir: PathBuf,

    /// File name prefix identifying a scan's CT source file.
    #[arg(long, global = true, default_value = DEFAULT_SOURCE_PREFIX, env = "CT_SOURCE_PREFIX")]
    pub source_prefix: String,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Maximum number of decoded volumes kept in memory.
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_VOLUME_CACHE_CAPACITY,
        env = "CT_CACHE_VOLUMES"
    )]
    pub cache_volumes: usize,

    // =========================================================================
    // Slice Configuration
    // =========================================================================
    /// JPEG quality for rendered slices (1-100).
    #[arg(long, global = true, default_value_t = DEFAULT_JPEG_QUALITY, env = "CT_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Cache-Control max-age advertised for slices, in seconds.
    #[arg(long, global = true, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "CT_CACHE_MAX_AGE")]
    pub cache_max_age: u64,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_volumes == 0 {
            return Err("cache_volumes must be greater than 0".to_string());
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.source_prefix.is_empty() {
            return Err(
                "source_prefix must not be empty. Set --source-prefix or CT_SOURCE_PREFIX"
                    .to_string(),
            );
        }

        Ok(())
    }
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print a scan's volume metadata as JSON.
    Info(InfoArgs),

    /// Render one or more slices of a scan to JPEG files.
    Slice(SliceArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// Scan identifier (directory name under the data dir).
    pub scan_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct SliceArgs {
    /// Scan identifier (directory name under the data dir).
    pub scan_id: String,

    /// Slicing axis: axial, sagittal or coronal.
    pub axis: String,

    /// Slice indices along the axis.
    #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
    pub indices: Vec<i64>,

    /// Window center in HU (default 40).
    #[arg(long, allow_negative_numbers = true)]
    pub wc: Option<f64>,

    /// Window width in HU (default 400).
    #[arg(long, allow_negative_numbers = true)]
    pub ww: Option<f64>,

    /// Directory the JPEG files are written to.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl SliceArgs {
    /// Output file name for one slice: `<scan_id>_<axis>_<index>.jpg`.
    pub fn file_name(&self, index: i64) -> String {
        format!("{}_{}_{}.jpg", self.scan_id, self.axis, index)
    }
}

// =============================================================================
// Tests
// =============================================================================
