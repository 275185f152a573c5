//! # CT Slicer
//!
//! Volumetric CT loading, caching and slice rendering for web viewers.
//!
//! A scan's raw CT file (MetaImage, NIfTI, or either inside a ZIP archive) is
//! decoded into a canonical `[x, y, z]` sample grid, a small number of
//! decoded volumes stay resident in memory, and windowed 8-bit grayscale
//! slices are rendered on demand along the axial, sagittal and coronal axes.
//!
//! ## Architecture
//!
//! - [`mod@format`] - MetaImage parser, NIfTI adapter, ZIP extraction, dispatch
//! - [`volume`] - canonical volume representation
//! - [`scan`] - scan storage, volume loader and bounded volume cache
//! - [`slice`] - windowing, plane rendering, JPEG encoding and the query service
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use ct_slicer::{CtService, LocalScanStore, ScanLoader, SliceAxis, SliceRequest, VolumeCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ct_slicer::VolumeError> {
//!     let store = LocalScanStore::new("data/scans");
//!     let service = CtService::new(VolumeCache::new(ScanLoader::new(store)));
//!
//!     let info = service.volume_info("scan-001").await?;
//!     println!("{:?}", info.dimensions);
//!
//!     let slice = service
//!         .render_slice(&SliceRequest::new("scan-001", SliceAxis::Axial, 40))
//!         .await?;
//!     println!("{} bytes", slice.data.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod scan;
pub mod slice;
pub mod volume;

// Re-export commonly used types
pub use config::{Cli, Command, Config, InfoArgs, SliceArgs};
pub use error::{ErrorResponse, FormatError, IoError, VolumeError};
pub use format::{decode_file, read_metaimage, MetaImageHeader, VolumeFormat};
pub use scan::{
    LocalScanStore, ScanLoader, ScanStore, VolumeCache, VolumeLoader,
    DEFAULT_VOLUME_CACHE_CAPACITY,
};
pub use slice::{
    render_plane, CtService, JpegSliceEncoder, SliceAxis, SliceRequest, SliceResponse,
    SliceSizes, VolumeInfo, Window, DEFAULT_JPEG_QUALITY,
};
pub use volume::{DecodedVolume, ElementType, Samples, Volume, Voxel};
