//! CT service: volume metadata and slice queries.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         CtService                            │
//! │   volume_info()                 render_slice()               │
//! │     1. get_or_load                1. get_or_load             │
//! │     2. summarize                  2. render_plane (blocking) │
//! │                                   3. encode JPEG (blocking)  │
//! │          │                               │                   │
//! │          ▼                               ▼                   │
//! │   ┌──────────────┐              ┌──────────────────┐         │
//! │   │ VolumeCache  │              │ JpegSliceEncoder │         │
//! │   └──────────────┘              └──────────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::VolumeError;
use crate::scan::{VolumeCache, VolumeLoader};
use crate::volume::Volume;

use super::encoder::{JpegSliceEncoder, JPEG_CONTENT_TYPE};
use super::render::{render_plane, SliceAxis};
use super::window::Window;

/// Default `max-age` advertised for rendered slices, in seconds.
pub const DEFAULT_CACHE_MAX_AGE: u64 = 3600;

// =============================================================================
// Volume Info
// =============================================================================

/// Raster `[width, height]` per slicing axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SliceSizes {
    pub axial: [usize; 2],
    pub sagittal: [usize; 2],
    pub coronal: [usize; 2],
}

impl SliceSizes {
    pub fn for_dimensions(dims: [usize; 3]) -> Self {
        Self {
            axial: SliceAxis::Axial.raster_size(dims),
            sagittal: SliceAxis::Sagittal.raster_size(dims),
            coronal: SliceAxis::Coronal.raster_size(dims),
        }
    }
}

/// Metadata returned by [`CtService::volume_info`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeInfo {
    pub scan_id: String,
    pub dimensions: [usize; 3],
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
    pub min_value: f64,
    pub max_value: f64,
    pub slice_sizes: SliceSizes,
}

impl VolumeInfo {
    pub fn from_volume(scan_id: impl Into<String>, volume: &Volume) -> Self {
        let (min_value, max_value) = volume.value_range();
        Self {
            scan_id: scan_id.into(),
            dimensions: volume.dimensions(),
            spacing: volume.spacing(),
            origin: volume.origin(),
            min_value,
            max_value,
            slice_sizes: SliceSizes::for_dimensions(volume.dimensions()),
        }
    }
}

// =============================================================================
// Slice Request / Response
// =============================================================================

/// A request for one windowed slice.
#[derive(Debug, Clone)]
pub struct SliceRequest {
    pub scan_id: String,
    pub axis: SliceAxis,
    pub index: i64,
    pub window: Window,
}

impl SliceRequest {
    /// Request with the default soft-tissue window.
    pub fn new(scan_id: impl Into<String>, axis: SliceAxis, index: i64) -> Self {
        Self {
            scan_id: scan_id.into(),
            axis,
            index,
            window: Window::default(),
        }
    }

    /// Build a request from raw query parameters.
    pub fn from_params(
        scan_id: impl Into<String>,
        axis: &str,
        index: i64,
        wc: Option<f64>,
        ww: Option<f64>,
    ) -> Result<Self, VolumeError> {
        Ok(Self {
            scan_id: scan_id.into(),
            axis: axis.parse()?,
            index,
            window: Window::from_params(wc, ww)?,
        })
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }
}

/// An encoded slice ready to be sent to a client.
#[derive(Debug, Clone)]
pub struct SliceResponse {
    /// JPEG bytes
    pub data: Bytes,

    pub width: u32,
    pub height: u32,

    pub content_type: &'static str,

    /// `Cache-Control` header value
    pub cache_control: String,
}

// =============================================================================
// CtService
// =============================================================================

/// Entry point for metadata and slice queries.
///
/// Every query goes through the shared [`VolumeCache`], so concurrent
/// requests for the same scan decode it once.
pub struct CtService<L: VolumeLoader> {
    cache: Arc<VolumeCache<L>>,
    encoder: JpegSliceEncoder,
    cache_max_age: u64,
}

impl<L: VolumeLoader> CtService<L> {
    pub fn new(cache: VolumeCache<L>) -> Self {
        Self::with_shared_cache(Arc::new(cache))
    }

    /// Create a service over a cache shared with other components.
    pub fn with_shared_cache(cache: Arc<VolumeCache<L>>) -> Self {
        Self {
            cache,
            encoder: JpegSliceEncoder::default(),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }

    pub fn with_encoder(mut self, encoder: JpegSliceEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_cache_max_age(mut self, seconds: u64) -> Self {
        self.cache_max_age = seconds;
        self
    }

    pub fn cache(&self) -> &Arc<VolumeCache<L>> {
        &self.cache
    }

    /// Dimensions, spacing, origin, value range and slice sizes of a scan.
    pub async fn volume_info(&self, scan_id: &str) -> Result<VolumeInfo, VolumeError> {
        let volume = self.cache.get_or_load(scan_id).await?;
        Ok(VolumeInfo::from_volume(scan_id, &volume))
    }

    /// Render and encode one slice.
    pub async fn render_slice(&self, request: &SliceRequest) -> Result<SliceResponse, VolumeError> {
        let volume = self.cache.get_or_load(&request.scan_id).await?;

        let axis = request.axis;
        let index = request.index;
        let window = request.window;
        let encoder = self.encoder;

        let (data, width, height) = tokio::task::spawn_blocking(move || {
            let image = render_plane(&volume, axis, index, window)?;
            let data = encoder.encode(&image)?;
            Ok::<_, VolumeError>((data, image.width(), image.height()))
        })
        .await
        .map_err(|e| {
            error!(scan_id = %request.scan_id, error = %e, "Slice render task failed");
            VolumeError::internal(format!("render task failed: {}", e))
        })??;

        debug!(
            scan_id = %request.scan_id,
            axis = %axis,
            index,
            wc = window.center,
            ww = window.width,
            bytes = data.len(),
            "Rendered slice"
        );

        Ok(SliceResponse {
            data,
            width,
            height,
            content_type: JPEG_CONTENT_TYPE,
            cache_control: format!("public, max-age={}", self.cache_max_age),
        })
    }
}
