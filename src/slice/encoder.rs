//! JPEG slice encoder.
//!
//! Windowed slices are single-channel 8-bit rasters; they are compressed to
//! baseline JPEG before leaving the service.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::GrayImage;

use crate::error::VolumeError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// MIME type of encoded slices.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

// =============================================================================
// JPEG Encoder
// =============================================================================

/// Grayscale JPEG encoder with a fixed quality.
#[derive(Debug, Clone, Copy)]
pub struct JpegSliceEncoder {
    quality: u8,
}

impl Default for JpegSliceEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl JpegSliceEncoder {
    /// Create an encoder; quality is clamped to 1-100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: clamp_quality(quality),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Compress a windowed slice.
    pub fn encode(&self, image: &GrayImage) -> Result<Bytes, VolumeError> {
        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, self.quality);

        encoder
            .encode_image(image)
            .map_err(|e| VolumeError::internal(format!("JPEG encoding failed: {}", e)))?;

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
