//! Scan lookup, volume loading and the volume cache.
//!
//! ```text
//!   VolumeCache ──miss──► ScanLoader ──► ScanStore (scan dir, source file)
//!        │                    │
//!        │                    └──► format::decode_file (blocking pool)
//!        └── hit ──► Arc<Volume>
//! ```

mod cache;
mod loader;
mod store;

pub use cache::{VolumeCache, DEFAULT_VOLUME_CACHE_CAPACITY};
pub use loader::{validate_scan_id, ScanLoader, VolumeLoader};
pub use store::{LocalScanStore, ScanStore, DEFAULT_SOURCE_PREFIX};
