//! Slice rendering.
//!
//! - [`window`]: HU windowing
//! - [`render`]: plane extraction along axial / sagittal / coronal axes
//! - [`encoder`]: JPEG compression of windowed rasters
//! - [`service`]: metadata and slice queries over the volume cache

pub mod encoder;
pub mod render;
pub mod service;
pub mod window;

pub use encoder::{
    clamp_quality, is_valid_quality, JpegSliceEncoder, DEFAULT_JPEG_QUALITY, JPEG_CONTENT_TYPE,
    MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use render::{check_index, render_plane, SliceAxis};
pub use service::{
    CtService, SliceRequest, SliceResponse, SliceSizes, VolumeInfo, DEFAULT_CACHE_MAX_AGE,
};
pub use window::{Window, WindowMapper, DEFAULT_WINDOW_CENTER, DEFAULT_WINDOW_WIDTH, EPSILON};
