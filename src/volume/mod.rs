//! Canonical in-memory volume representation.
//!
//! Every loader normalizes its output to a [`Volume`] whose samples are
//! indexed `[x, y, z]`, regardless of how the source file stores them.
//!
//! ```text
//!   source file ──► parser/adapter ──► DecodedVolume ──► Volume::new
//!                                       (samples,          (value range,
//!                                        spacing, origin)   dimensions)
//! ```

mod samples;

pub use samples::{ElementType, Samples, Voxel};
pub(crate) use samples::with_array;

// =============================================================================
// DecodedVolume
// =============================================================================

/// Output of a format parser before the value range is computed.
#[derive(Debug, Clone)]
pub struct DecodedVolume {
    /// Samples in canonical `[x, y, z]` order
    pub samples: Samples,

    /// Millimetres per voxel along x, y, z
    pub spacing: [f64; 3],

    /// World position of voxel (0, 0, 0) in millimetres
    pub origin: [f64; 3],
}

// =============================================================================
// Volume
// =============================================================================

/// A decoded 3-D scan.
///
/// Immutable once constructed. The [`crate::scan::VolumeCache`] owns volumes
/// and hands out shared `Arc<Volume>` views.
#[derive(Debug, Clone)]
pub struct Volume {
    samples: Samples,
    spacing: [f64; 3],
    origin: [f64; 3],
    value_range: (f64, f64),
}

impl Volume {
    /// Build a volume, scanning the samples once for their value range.
    pub fn new(decoded: DecodedVolume) -> Self {
        let value_range = decoded.samples.value_range();
        Self {
            samples: decoded.samples,
            spacing: decoded.spacing,
            origin: decoded.origin,
            value_range,
        }
    }

    /// Voxel counts `[nx, ny, nz]`.
    pub fn dimensions(&self) -> [usize; 3] {
        self.samples.dim()
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// `(min, max)` over all finite samples, for display only.
    pub fn value_range(&self) -> (f64, f64) {
        self.value_range
    }

    pub fn element_type(&self) -> ElementType {
        self.samples.element_type()
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Total number of voxels.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
