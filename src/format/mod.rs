//! Volume file formats.
//!
//! - [`external`]: adapter over the `nifti` crate, plus the fallback reader
//! - [`metaimage`]: MetaImage `.mhd` + raw payload reader
//! - [`archive`]: ZIP extraction into a scoped scratch directory
//! - [`detect`]: name-based detection and dispatch

pub mod archive;
pub mod detect;
pub mod external;
pub mod metaimage;

pub use archive::{extract_archive, select_candidate, ExtractedArchive, CANDIDATE_EXTENSIONS};
pub use detect::{decode_file, VolumeFormat};
pub use external::{read_any, read_nifti};
pub use metaimage::{
    decode_payload, element_type_from_name, read_metaimage, MetaImageHeader, ELEMENT_TYPE_TABLE,
};
