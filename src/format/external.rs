//! NIfTI adapter.
//!
//! Decoding is delegated to the `nifti` crate. This module only normalizes
//! its output: samples become an `[x, y, z]` [`Samples`] grid, 64-bit data is
//! narrowed to `f32`, spacing comes from `pixdim[1..4]` and the origin from
//! the header's affine.

use std::ops::{Add, Mul};
use std::path::Path;

use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::volume::element::DataElement;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, NiftiType, NiftiVolume, ReaderOptions};
use tracing::{debug, warn};

use crate::error::FormatError;
use crate::volume::{DecodedVolume, Samples, Voxel};

/// Read a `.nii` / `.nii.gz` file.
///
/// Failures are reported as decode errors: the caller already decided the
/// file is NIfTI.
pub fn read_nifti(path: &Path) -> Result<DecodedVolume, FormatError> {
    let object = ReaderOptions::new()
        .read_file(path)
        .map_err(|e| FormatError::Decode(format!("{}: {}", path.display(), e)))?;
    normalize(object.header().clone(), object.into_volume())
}

/// Last-resort reader for files with no dedicated decoder.
///
/// Anything the `nifti` crate cannot open (for example NRRD) is reported as
/// an unsupported format.
pub fn read_any(path: &Path) -> Result<DecodedVolume, FormatError> {
    let object = ReaderOptions::new().read_file(path).map_err(|e| {
        debug!(path = %path.display(), error = %e, "Fallback reader rejected file");
        FormatError::UnsupportedFormat {
            reason: format!(
                "'{}' is not a readable volume. Supported: .mhd, .nii, .nii.gz, .zip",
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ),
        }
    })?;
    normalize(object.header().clone(), object.into_volume())
}

fn normalize<V>(header: NiftiHeader, volume: V) -> Result<DecodedVolume, FormatError>
where
    V: NiftiVolume + IntoNdArray,
{
    let data_type = volume.data_type();
    let scaled = has_scaling(&header);

    debug!(?data_type, scaled, dim = ?header.dim, "Normalizing NIfTI volume");

    let samples = if scaled {
        Samples::Float32(read_grid::<f32, _>(volume)?)
    } else {
        match data_type {
            NiftiType::Int8 => Samples::Int8(read_grid(volume)?),
            NiftiType::Uint8 => Samples::UInt8(read_grid(volume)?),
            NiftiType::Int16 => Samples::Int16(read_grid(volume)?),
            NiftiType::Uint16 => Samples::UInt16(read_grid(volume)?),
            NiftiType::Int32 => Samples::Int32(read_grid(volume)?),
            NiftiType::Uint32 => Samples::UInt32(read_grid(volume)?),
            NiftiType::Float32 => Samples::Float32(read_grid(volume)?),
            // Wide types are narrowed to keep memory bounded
            NiftiType::Float64 | NiftiType::Int64 | NiftiType::Uint64 => {
                Samples::Float32(read_grid::<f64, _>(volume)?.mapv(|v| v as f32))
            }
            other => {
                return Err(FormatError::UnsupportedFormat {
                    reason: format!("NIfTI data type {:?} is not a scalar volume", other),
                })
            }
        }
    };

    let [nx, ny, nz] = samples.dim();
    Ok(DecodedVolume {
        samples,
        spacing: spacing(&header),
        origin: origin(&header, [nx, ny, nz]),
    })
}

/// Whether `scl_slope` / `scl_inter` change the stored values.
fn has_scaling(header: &NiftiHeader) -> bool {
    let slope = header.scl_slope;
    let inter = header.scl_inter;
    if slope == 0.0 || !slope.is_finite() {
        return false;
    }
    slope != 1.0 || (inter != 0.0 && inter.is_finite())
}

fn read_grid<T, V>(volume: V) -> Result<Array3<T>, FormatError>
where
    T: DataElement + Voxel + Mul<Output = T> + Add<Output = T>,
    V: IntoNdArray,
{
    let data: ArrayD<T> = volume
        .into_ndarray::<T>()
        .map_err(|e| FormatError::Decode(e.to_string()))?;
    to_three_dims(data)
}

/// Collapse trailing axes (keeping the first time point) or pad missing ones.
fn to_three_dims<T>(mut data: ArrayD<T>) -> Result<Array3<T>, FormatError> {
    while data.ndim() > 3 {
        let last = data.ndim() - 1;
        data = data.index_axis_move(Axis(last), 0);
    }
    while data.ndim() < 3 {
        let next = data.ndim();
        data = data.insert_axis(Axis(next));
    }
    data.into_dimensionality::<Ix3>()
        .map_err(|e| FormatError::Decode(e.to_string()))
}

/// First three zooms from `pixdim`.
fn spacing(header: &NiftiHeader) -> [f64; 3] {
    let mut spacing = [1.0; 3];
    for (i, slot) in spacing.iter_mut().enumerate() {
        let zoom = f64::from(header.pixdim[i + 1]).abs();
        if zoom.is_finite() && zoom > 0.0 {
            *slot = zoom;
        } else {
            warn!(axis = i, zoom, "Invalid pixdim, using 1.0");
        }
    }
    spacing
}

/// Translation column of the best available affine.
fn origin(header: &NiftiHeader, dims: [usize; 3]) -> [f64; 3] {
    if header.sform_code > 0 {
        [
            f64::from(header.srow_x[3]),
            f64::from(header.srow_y[3]),
            f64::from(header.srow_z[3]),
        ]
    } else if header.qform_code > 0 {
        [
            f64::from(header.quatern_x),
            f64::from(header.quatern_y),
            f64::from(header.quatern_z),
        ]
    } else {
        // Base affine: grid centred on the origin, x axis flipped
        let zooms = spacing(header);
        [
            (dims[0] as f64 - 1.0) / 2.0 * zooms[0],
            -(dims[1] as f64 - 1.0) / 2.0 * zooms[1],
            -(dims[2] as f64 - 1.0) / 2.0 * zooms[2],
        ]
    }
}
