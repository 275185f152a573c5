//! Plane extraction and raster construction.
//!
//! ```text
//!   axis       fixed   plane (cols × rows)
//!   axial      z       nx × ny
//!   sagittal   x       ny × nz
//!   coronal    y       nx × nz
//! ```
//!
//! Columns follow the plane's first spatial axis and rows its second, with
//! the origin at the top-left of the raster.

use std::fmt;
use std::str::FromStr;

use image::GrayImage;
use ndarray::{Array3, Axis};
use serde::Serialize;

use crate::error::VolumeError;
use crate::volume::{with_array, Volume, Voxel};

use super::window::{Window, WindowMapper};

// =============================================================================
// SliceAxis
// =============================================================================

/// The three orthogonal slicing planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceAxis {
    Axial,
    Sagittal,
    Coronal,
}

impl SliceAxis {
    pub const ALL: [SliceAxis; 3] = [SliceAxis::Axial, SliceAxis::Sagittal, SliceAxis::Coronal];

    pub const fn name(&self) -> &'static str {
        match self {
            SliceAxis::Axial => "axial",
            SliceAxis::Sagittal => "sagittal",
            SliceAxis::Coronal => "coronal",
        }
    }

    /// Index of the volume axis held fixed by this plane.
    pub const fn fixed_axis(&self) -> usize {
        match self {
            SliceAxis::Axial => 2,
            SliceAxis::Sagittal => 0,
            SliceAxis::Coronal => 1,
        }
    }

    /// Number of slices along this axis.
    pub fn extent(&self, dims: [usize; 3]) -> usize {
        dims[self.fixed_axis()]
    }

    /// Raster `[width, height]` of one slice.
    pub fn raster_size(&self, dims: [usize; 3]) -> [usize; 2] {
        let [nx, ny, nz] = dims;
        match self {
            SliceAxis::Axial => [nx, ny],
            SliceAxis::Sagittal => [ny, nz],
            SliceAxis::Coronal => [nx, nz],
        }
    }
}

impl fmt::Display for SliceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SliceAxis {
    type Err = VolumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "axial" => Ok(SliceAxis::Axial),
            "sagittal" => Ok(SliceAxis::Sagittal),
            "coronal" => Ok(SliceAxis::Coronal),
            other => Err(VolumeError::validation(format!(
                "Unknown axis '{}'. Use axial, sagittal, or coronal.",
                other
            ))),
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Check `index` against the slice count along `axis`.
pub fn check_index(dims: [usize; 3], axis: SliceAxis, index: i64) -> Result<usize, VolumeError> {
    let extent = axis.extent(dims);
    usize::try_from(index)
        .ok()
        .filter(|&i| i < extent)
        .ok_or_else(|| {
            VolumeError::validation(format!(
                "Index {} out of range [0, {}] for {} axis",
                index,
                extent as i64 - 1,
                axis
            ))
        })
}

/// Extract one plane of `volume` and window it into an 8-bit raster.
pub fn render_plane(
    volume: &Volume,
    axis: SliceAxis,
    index: i64,
    window: Window,
) -> Result<GrayImage, VolumeError> {
    let index = check_index(volume.dimensions(), axis, index)?;
    let [width, height] = axis.raster_size(volume.dimensions());
    let mapper = window.mapper();

    let pixels = with_array!(volume.samples(), arr => window_plane(arr, axis, index, &mapper));

    GrayImage::from_raw(width as u32, height as u32, pixels).ok_or_else(|| {
        VolumeError::internal(format!(
            "raster buffer does not match {}x{} plane",
            width, height
        ))
    })
}

fn window_plane<T: Voxel>(
    arr: &Array3<T>,
    axis: SliceAxis,
    index: usize,
    mapper: &WindowMapper,
) -> Vec<u8> {
    let plane = arr.index_axis(Axis(axis.fixed_axis()), index);
    // Transposed view iterates row by row over the plane's second axis.
    plane.t().iter().map(|v| mapper.map(v.to_f64())).collect()
}
