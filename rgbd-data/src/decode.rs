//! Strict decode-and-validate over in-memory image bytes.
//!
//! The conversion pipeline never keeps decoded pixels. Decoding exists to
//! recover each file's dimensions and to prove that its bytes really are
//! the codec and channel count the modality contract demands. Decoding is
//! a pure function of the input bytes; no decode context is shared across
//! samples.

use crate::modality::{ImageFormat, ModalityContract};
use thiserror::Error;

/// Errors from decode-time validation.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream did not parse as the expected codec.
    #[error("failed to decode bytes as {format:?}: {source}")]
    Format {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },

    /// The decoded channel count does not match the modality contract.
    #[error("channel mismatch: decoded {actual} channels, contract requires {expected}")]
    ChannelMismatch { expected: u8, actual: u8 },
}

/// Dimensions recovered from a successful decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDims {
    pub height: u32,
    pub width: u32,
    pub channels: u8,
}

/// Decode `bytes` as `format` and return the pixel grid's dimensions.
pub fn decode_dims(bytes: &[u8], format: ImageFormat) -> Result<ImageDims, DecodeError> {
    let decoded = image::load_from_memory_with_format(bytes, format.as_image_format())
        .map_err(|source| DecodeError::Format { format, source })?;

    Ok(ImageDims {
        height: decoded.height(),
        width: decoded.width(),
        channels: decoded.color().channel_count(),
    })
}

/// Decode `bytes` and enforce a full modality contract in one step.
pub fn decode_checked(bytes: &[u8], contract: ModalityContract) -> Result<ImageDims, DecodeError> {
    let dims = decode_dims(bytes, contract.format)?;
    if dims.channels != contract.channels {
        return Err(DecodeError::ChannelMismatch {
            expected: contract.channels,
            actual: dims.channels,
        });
    }
    Ok(dims)
}
