//! Checksummed record framing for shard files.
//!
//! A shard file is a plain concatenation of framed records:
//!
//! ```text
//! u64le  payload length
//! u32le  masked crc32c of the 8 length bytes
//! [u8]   payload
//! u32le  masked crc32c of the payload
//! ```
//!
//! The CRC is Castagnoli CRC-32, masked the way the downstream reader
//! expects: rotate right by 15 bits, then add a fixed delta. Masking keeps
//! a CRC computed over bytes that themselves contain CRCs from degenerating.

use std::io::{self, Read, Write};
use thiserror::Error;

const MASK_DELTA: u32 = 0xa282_ead8;

/// Errors reading a framed record back.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("record header truncated")]
    TruncatedHeader,

    #[error("record payload truncated: expected {expected} bytes")]
    TruncatedPayload { expected: u64 },

    #[error("length checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    LengthChecksum { stored: u32, computed: u32 },

    #[error("payload checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    PayloadChecksum { stored: u32, computed: u32 },
}

/// Masked Castagnoli CRC of `bytes`.
pub fn masked_crc32c(bytes: &[u8]) -> u32 {
    let crc = crc32c::crc32c(bytes);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

/// Frame one payload onto `writer`.
pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let length = (payload.len() as u64).to_le_bytes();
    writer.write_all(&length)?;
    writer.write_all(&masked_crc32c(&length).to_le_bytes())?;
    writer.write_all(payload)?;
    writer.write_all(&masked_crc32c(payload).to_le_bytes())?;
    Ok(())
}

/// Read the next framed payload from `reader`, verifying both checksums.
///
/// Returns `Ok(None)` at a clean end of stream. The length checksum is
/// verified before the payload buffer is allocated, so a corrupt header
/// cannot request an absurd allocation.
pub fn read_record<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, RecordError> {
    let mut length_bytes = [0u8; 8];
    let mut filled = 0;
    while filled < length_bytes.len() {
        let n = reader.read(&mut length_bytes[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled == 0 {
        return Ok(None);
    }
    if filled < length_bytes.len() {
        return Err(RecordError::TruncatedHeader);
    }

    let stored = read_u32le(reader).ok_or(RecordError::TruncatedHeader)??;
    let computed = masked_crc32c(&length_bytes);
    if stored != computed {
        return Err(RecordError::LengthChecksum { stored, computed });
    }

    let length = u64::from_le_bytes(length_bytes);
    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            RecordError::TruncatedPayload { expected: length }
        } else {
            RecordError::Io(e)
        }
    })?;

    let stored = read_u32le(reader).ok_or(RecordError::TruncatedPayload { expected: length })??;
    let computed = masked_crc32c(&payload);
    if stored != computed {
        return Err(RecordError::PayloadChecksum { stored, computed });
    }

    Ok(Some(payload))
}

/// Little-endian u32, with `None` on a clean-or-not EOF so the caller can
/// attach the right truncation error.
fn read_u32le<R: Read>(reader: &mut R) -> Option<Result<u32, RecordError>> {
    let mut bytes = [0u8; 4];
    match reader.read_exact(&mut bytes) {
        Ok(()) => Some(Ok(u32::from_le_bytes(bytes))),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(e) => Some(Err(RecordError::Io(e))),
    }
}
