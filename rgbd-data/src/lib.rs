//! RGB-D Dataset Crate
//!
//! Input-side model for the rgbd conversion pipeline: dataset splits,
//! per-modality decode contracts, strict image validation, and triplet
//! enumeration. This crate never touches the persisted record format;
//! it only turns a directory tree into an ordered sequence of validated
//! file references.

pub mod decode;
pub mod enumerate;
pub mod modality;
pub mod split;
pub mod types;

pub use decode::{DecodeError, ImageDims, decode_checked, decode_dims};
pub use enumerate::{EnumerateError, enumerate_samples};
pub use modality::{DepthEncoding, ImageFormat, Modality, ModalityContract};
pub use split::DatasetSplit;
pub use types::Sample;
