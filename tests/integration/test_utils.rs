//! Test utilities for integration tests.
//!
//! Fixture writers for MetaImage, NIfTI-1 and ZIP inputs, and a counting
//! mock loader for cache tests.

use async_trait::async_trait;
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use ndarray::Array3;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use zip::write::SimpleFileOptions;

use ct_slicer::{DecodedVolume, Samples, Volume, VolumeError, VolumeLoader};

// =============================================================================
// Sample Data
// =============================================================================

/// Sample value at `(x, y, z)` for the ramp fixtures.
pub fn ramp_value(x: usize, y: usize, z: usize) -> i16 {
    (x + 10 * y + 100 * z) as i16
}

/// Ramp samples in file order (x fastest, then y, then z).
pub fn ramp_i16(dims: [usize; 3]) -> Vec<i16> {
    let [nx, ny, nz] = dims;
    let mut values = Vec::with_capacity(nx * ny * nz);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                values.push(ramp_value(x, y, z));
            }
        }
    }
    values
}

pub fn i16_le_bytes(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Check JPEG SOI / EOI markers.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 4 && data[..2] == [0xFF, 0xD8] && data[data.len() - 2..] == [0xFF, 0xD9]
}

// =============================================================================
// MetaImage Fixtures
// =============================================================================

/// Header fields for a synthetic MetaImage file.
#[derive(Debug, Clone)]
pub struct MetaImageSpec {
    pub dims: [usize; 3],
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
    pub element_type: &'static str,
    pub compressed: bool,
}

impl MetaImageSpec {
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            spacing: [0.7, 0.7, 2.5],
            origin: [-120.0, -95.5, 310.0],
            element_type: "MET_SHORT",
            compressed: false,
        }
    }

    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    pub fn element_type(mut self, element_type: &'static str) -> Self {
        self.element_type = element_type;
        self
    }

    fn header(&self, data_file: &str) -> String {
        let [nx, ny, nz] = self.dims;
        let [sx, sy, sz] = self.spacing;
        let [ox, oy, oz] = self.origin;
        format!(
            "ObjectType = Image\n\
             NDims = 3\n\
             BinaryData = True\n\
             BinaryDataByteOrderMSB = False\n\
             CompressedData = {}\n\
             Offset = {} {} {}\n\
             ElementSpacing = {} {} {}\n\
             DimSize = {} {} {}\n\
             ElementType = {}\n\
             ElementDataFile = {}\n",
            if self.compressed { "True" } else { "False" },
            ox,
            oy,
            oz,
            sx,
            sy,
            sz,
            nx,
            ny,
            nz,
            self.element_type,
            data_file
        )
    }

    /// Data file name and stored bytes; `payload` is deflated when compressed.
    fn data_file(&self, stem: &str, payload: &[u8]) -> (String, Vec<u8>) {
        if self.compressed {
            (format!("{}.zraw", stem), zlib(payload))
        } else {
            (format!("{}.raw", stem), payload.to_vec())
        }
    }

    /// Write `<stem>.mhd` plus its payload into `dir`; returns the header path.
    pub fn write(&self, dir: &Path, stem: &str, payload: &[u8]) -> PathBuf {
        let (data_file, bytes) = self.data_file(stem, payload);

        std::fs::write(dir.join(&data_file), bytes).unwrap();
        let header_path = dir.join(format!("{}.mhd", stem));
        std::fs::write(&header_path, self.header(&data_file)).unwrap();
        header_path
    }

    /// Header and payload as in-memory ZIP entries under `prefix`.
    pub fn zip_entries(&self, prefix: &str, stem: &str, payload: &[u8]) -> Vec<(String, Vec<u8>)> {
        let (data_file, bytes) = self.data_file(stem, payload);
        vec![
            (
                format!("{}{}.mhd", prefix, stem),
                self.header(&data_file).into_bytes(),
            ),
            (format!("{}{}", prefix, data_file), bytes),
        ]
    }
}

// =============================================================================
// NIfTI-1 Fixtures
// =============================================================================

/// Hand-built single-file NIfTI-1 (`n+1`) image with int16 samples.
///
/// `values` are in file order (x fastest).
pub fn nifti1_i16(
    dims: [usize; 3],
    pixdim: [f32; 3],
    srow_offset: Option<[f32; 3]>,
    scl: (f32, f32),
    values: &[i16],
) -> Vec<u8> {
    let mut header = vec![0u8; 348];
    let put_i16 = |buf: &mut Vec<u8>, offset: usize, v: i16| {
        buf[offset..offset + 2].copy_from_slice(&v.to_le_bytes())
    };
    let put_f32 = |buf: &mut Vec<u8>, offset: usize, v: f32| {
        buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes())
    };

    header[0..4].copy_from_slice(&348i32.to_le_bytes());
    header[38] = b'r';

    // dim[0..8]
    put_i16(&mut header, 40, 3);
    for (i, &d) in dims.iter().enumerate() {
        put_i16(&mut header, 42 + 2 * i, d as i16);
    }
    for i in 3..7 {
        put_i16(&mut header, 42 + 2 * i, 1);
    }

    put_i16(&mut header, 70, 4); // datatype: INT16
    put_i16(&mut header, 72, 16); // bitpix

    // pixdim[0..8]
    put_f32(&mut header, 76, 1.0);
    for (i, &p) in pixdim.iter().enumerate() {
        put_f32(&mut header, 80 + 4 * i, p);
    }

    put_f32(&mut header, 108, 352.0); // vox_offset
    put_f32(&mut header, 112, scl.0);
    put_f32(&mut header, 116, scl.1);

    if let Some([ox, oy, oz]) = srow_offset {
        put_i16(&mut header, 254, 1); // sform_code
        put_f32(&mut header, 280, pixdim[0]);
        put_f32(&mut header, 292, ox);
        put_f32(&mut header, 300, pixdim[1]);
        put_f32(&mut header, 308, oy);
        put_f32(&mut header, 320, pixdim[2]);
        put_f32(&mut header, 324, oz);
    }

    header[344..348].copy_from_slice(b"n+1\0");

    let mut file = header;
    file.extend_from_slice(&[0u8; 4]); // no extensions
    file.extend(i16_le_bytes(values));
    file
}

// =============================================================================
// Scan Directories and Archives
// =============================================================================

/// Create `<root>/<scan_id>` and return its path.
pub fn create_scan(root: &Path, scan_id: &str) -> PathBuf {
    let dir = root.join(scan_id);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) {
    let mut writer = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    for (name, data) in entries {
        writer
            .start_file(name.as_str(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

// =============================================================================
// Mock Loader
// =============================================================================

/// Loader returning a small ramp volume and counting its calls.
///
/// Scan ids starting with `missing` fail with `NotFound`.
pub struct CountingLoader {
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for CountingLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VolumeLoader for CountingLoader {
    async fn load(&self, scan_id: &str) -> Result<Volume, VolumeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if scan_id.starts_with("missing") {
            return Err(VolumeError::not_found("Scan"));
        }

        let data = Array3::from_shape_fn((6, 5, 4), |(x, y, z)| ramp_value(x, y, z));
        Ok(Volume::new(DecodedVolume {
            samples: Samples::Int16(data),
            spacing: [1.0, 1.0, 2.0],
            origin: [0.0; 3],
        }))
    }
}
