//! MetaImage (`.mhd` + `.raw` / `.zraw`) reader.
//!
//! The header is plain text made of `key = value` lines. Lines without `=`
//! are ignored; keys and values are trimmed. The payload lives in a separate
//! file named by `ElementDataFile`, resolved relative to the header.
//!
//! # Recognized keys
//!
//! | Key               | Required | Default      |
//! |-------------------|----------|--------------|
//! | `DimSize`         | yes      |              |
//! | `ElementSpacing`  | no       | `1 1 1`      |
//! | `Offset`          | no       | `0 0 0`      |
//! | `ElementType`     | no       | `MET_SHORT`  |
//! | `ElementDataFile` | yes      |              |
//! | `CompressedData`  | no       | `False`      |
//!
//! # Payload layout
//!
//! Samples are little-endian with X varying fastest, which is a row-major
//! array of shape `(nz, ny, nx)`. The reader reverses the axes so the result
//! is indexed `[x, y, z]`. Bytes past `nx * ny * nz * itemsize` are ignored.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use flate2::read::ZlibDecoder;
use ndarray::Array3;
use tracing::{debug, warn};

use crate::error::{FormatError, IoError};
use crate::volume::{DecodedVolume, ElementType, Samples, Voxel};

/// `ElementType` used when the header does not name one.
pub const DEFAULT_ELEMENT_TYPE: ElementType = ElementType::Int16;

/// MetaImage element type names and the sample type each maps to.
pub const ELEMENT_TYPE_TABLE: [(&str, ElementType); 8] = [
    ("MET_SHORT", ElementType::Int16),
    ("MET_USHORT", ElementType::UInt16),
    ("MET_INT", ElementType::Int32),
    ("MET_UINT", ElementType::UInt32),
    ("MET_FLOAT", ElementType::Float32),
    ("MET_DOUBLE", ElementType::Float64),
    ("MET_UCHAR", ElementType::UInt8),
    ("MET_CHAR", ElementType::Int8),
];

/// Look up a MetaImage element type name.
pub fn element_type_from_name(name: &str) -> Option<ElementType> {
    ELEMENT_TYPE_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, element_type)| *element_type)
}

// =============================================================================
// Header
// =============================================================================

/// Parsed MetaImage header.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaImageHeader {
    /// Voxel counts `[nx, ny, nz]`
    pub dimensions: [usize; 3],

    /// Millimetres per voxel
    pub spacing: [f64; 3],

    /// World origin in millimetres
    pub origin: [f64; 3],

    pub element_type: ElementType,

    /// Payload file name, relative to the header's directory
    pub data_file: String,

    /// Whether the payload is zlib-compressed
    pub compressed: bool,
}

impl MetaImageHeader {
    /// Parse header text.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let mut fields: HashMap<&str, &str> = HashMap::new();
        for line in text.lines() {
            if let Some((key, value)) = line.split_once('=') {
                fields.insert(key.trim(), value.trim());
            }
        }

        let dimensions: [usize; 3] = parse_triple(
            "DimSize",
            fields.get("DimSize").ok_or(FormatError::MissingKey("DimSize"))?,
        )?;
        if dimensions.contains(&0) {
            return Err(FormatError::InvalidValue {
                key: "DimSize",
                message: format!("dimensions must be positive, got {:?}", dimensions),
            });
        }

        let spacing: [f64; 3] =
            parse_triple("ElementSpacing", fields.get("ElementSpacing").unwrap_or(&"1 1 1"))?;
        if spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(FormatError::InvalidValue {
                key: "ElementSpacing",
                message: format!("spacing must be positive, got {:?}", spacing),
            });
        }

        let origin: [f64; 3] = parse_triple("Offset", fields.get("Offset").unwrap_or(&"0 0 0"))?;

        let element_type = match fields.get("ElementType") {
            None => DEFAULT_ELEMENT_TYPE,
            Some(name) => element_type_from_name(name).unwrap_or_else(|| {
                warn!(element_type = %name, "Unknown ElementType, reading as MET_SHORT");
                DEFAULT_ELEMENT_TYPE
            }),
        };

        let data_file = match fields.get("ElementDataFile") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(FormatError::MissingKey("ElementDataFile")),
        };

        let compressed = fields
            .get("CompressedData")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            dimensions,
            spacing,
            origin,
            element_type,
            data_file,
            compressed,
        })
    }

    pub fn voxel_count(&self) -> usize {
        self.dimensions.iter().product()
    }

    /// Number of payload bytes the header requires.
    pub fn expected_bytes(&self) -> Result<usize, FormatError> {
        self.dimensions
            .iter()
            .try_fold(self.element_type.size(), |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| FormatError::InvalidValue {
                key: "DimSize",
                message: format!("volume of {:?} voxels is too large", self.dimensions),
            })
    }
}

/// Parse the first three whitespace-separated values of a header field.
fn parse_triple<T>(key: &'static str, value: &str) -> Result<[T; 3], FormatError>
where
    T: FromStr + Copy + Default,
{
    let mut out = [T::default(); 3];
    let mut tokens = value.split_whitespace();
    for slot in out.iter_mut() {
        let token = tokens.next().ok_or_else(|| FormatError::InvalidValue {
            key,
            message: format!("expected three values, got '{}'", value),
        })?;
        *slot = token.parse().map_err(|_| FormatError::InvalidValue {
            key,
            message: format!("'{}' is not a number", token),
        })?;
    }
    Ok(out)
}

// =============================================================================
// Reader
// =============================================================================

/// Read a MetaImage header and its payload.
pub fn read_metaimage(header_path: &Path) -> Result<DecodedVolume, FormatError> {
    let text = fs::read(header_path).map_err(IoError::from)?;
    let header = MetaImageHeader::parse(&String::from_utf8_lossy(&text))?;

    let data_path = header_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&header.data_file);

    debug!(
        data_file = %data_path.display(),
        dimensions = ?header.dimensions,
        element_type = header.element_type.name(),
        compressed = header.compressed,
        "Reading MetaImage payload"
    );

    let raw = match fs::read(&data_path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FormatError::DataFileNotFound {
                path: data_path.display().to_string(),
            });
        }
        Err(e) => return Err(IoError::from(e).into()),
    };

    let payload = if header.compressed {
        debug!(compressed_bytes = raw.len(), "Inflating payload");
        inflate(&raw, header.expected_bytes()?)?
    } else {
        raw
    };

    let samples = decode_payload(&header, &payload)?;

    Ok(DecodedVolume {
        samples,
        spacing: header.spacing,
        origin: header.origin,
    })
}

/// Inflate a zlib stream, stopping after `limit` output bytes.
///
/// Output past the expected payload size is never used, so the header cannot
/// make the buffer grow beyond what the stream actually holds.
fn inflate(raw: &[u8], limit: usize) -> Result<Vec<u8>, FormatError> {
    let mut out = Vec::new();
    ZlibDecoder::new(raw)
        .take(limit as u64)
        .read_to_end(&mut out)
        .map_err(|e| FormatError::Decompress(e.to_string()))?;
    Ok(out)
}

/// Interpret payload bytes according to the header.
pub fn decode_payload(header: &MetaImageHeader, payload: &[u8]) -> Result<Samples, FormatError> {
    let expected = header.expected_bytes()?;
    if payload.len() < expected {
        return Err(FormatError::DataTooSmall {
            expected,
            actual: payload.len(),
        });
    }

    let payload = &payload[..expected];
    let dims = header.dimensions;
    let samples = match header.element_type {
        ElementType::Int8 => Samples::Int8(decode_grid(payload, dims)?),
        ElementType::UInt8 => Samples::UInt8(decode_grid(payload, dims)?),
        ElementType::Int16 => Samples::Int16(decode_grid(payload, dims)?),
        ElementType::UInt16 => Samples::UInt16(decode_grid(payload, dims)?),
        ElementType::Int32 => Samples::Int32(decode_grid(payload, dims)?),
        ElementType::UInt32 => Samples::UInt32(decode_grid(payload, dims)?),
        ElementType::Float32 => Samples::Float32(decode_grid(payload, dims)?),
        ElementType::Float64 => Samples::Float64(decode_grid(payload, dims)?),
    };
    Ok(samples)
}

/// Decode an x-fastest buffer into an `[x, y, z]` indexed array.
fn decode_grid<T: Voxel>(payload: &[u8], dims: [usize; 3]) -> Result<Array3<T>, FormatError> {
    let [nx, ny, nz] = dims;
    let values: Vec<T> = payload
        .chunks_exact(T::ELEMENT_TYPE.size())
        .map(T::from_le_slice)
        .collect();

    let grid = Array3::from_shape_vec((nz, ny, nx), values).map_err(|e| {
        FormatError::InvalidValue {
            key: "DimSize",
            message: e.to_string(),
        }
    })?;

    Ok(grid.reversed_axes())
}

// =============================================================================
// Tests
// =============================================================================
