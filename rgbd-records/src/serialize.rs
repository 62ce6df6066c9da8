//! Sample serialization: disk bytes to a validated record payload.
//!
//! Reads each modality's raw encoded bytes, proves them against the
//! modality contract, and packages bytes, format tag, and decoded
//! dimensions into one payload. All-or-nothing: a failure on any modality
//! produces no partial payload.

use crate::example::{Example, Feature};
use rgbd_data::{DecodeError, DepthEncoding, Modality, Sample, decode_checked};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::trace;

/// Errors producing a record payload from one sample.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// A referenced input file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A modality failed decode-time validation.
    #[error("{modality} modality of sample '{stem}': {source}")]
    Decode {
        stem: String,
        modality: Modality,
        #[source]
        source: DecodeError,
    },
}

/// Serialize one sample into payload bytes.
///
/// Each modality's height/width are recorded from its own decode; the
/// pipeline does not require the three grids to agree spatially.
pub fn serialize_sample(
    sample: &Sample,
    depth_encoding: DepthEncoding,
) -> Result<Vec<u8>, SerializeError> {
    let mut example = Example::new();

    for modality in Modality::ALL {
        let path = sample.path_for(modality);
        let bytes = std::fs::read(path).map_err(|source| SerializeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let contract = modality.contract(depth_encoding);
        let dims = decode_checked(&bytes, contract).map_err(|source| SerializeError::Decode {
            stem: sample.stem.clone(),
            modality,
            source,
        })?;
        trace!(
            "Sample '{}' {} decoded as {}x{}",
            sample.stem, modality, dims.height, dims.width
        );

        let prefix = modality.key_prefix();
        example.insert(format!("{prefix}/encoded"), Feature::bytes(bytes));
        example.insert(
            format!("{prefix}/format"),
            Feature::bytes(contract.tag.as_bytes().to_vec()),
        );
        example.insert(format!("{prefix}/height"), Feature::int64(i64::from(dims.height)));
        example.insert(format!("{prefix}/width"), Feature::int64(i64::from(dims.width)));
    }

    Ok(example.encode())
}
