//! Compressed record detection and decompression.
//!
//! Some stores hold record payloads as raw deflate streams. A compressed
//! payload is framed as an 8-byte header (uncompressed size as u32, then a
//! u32 of unknown meaning), the deflate stream, and the 3-byte trailer
//! `00 00 02` that identifies the framing.

use byteorder::{ByteOrder, LittleEndian};
use flate2::read::DeflateDecoder;
use std::io::Read;

use crate::cronos::constants::{COMPRESSED_HEADER_SIZE, COMPRESSED_MIN_LEN, COMPRESSED_TRAILER};
use crate::CroError;

/// Check whether a decoded payload uses the compressed framing.
pub fn is_compressed(data: &[u8]) -> bool {
    data.len() > COMPRESSED_MIN_LEN && data.ends_with(&COMPRESSED_TRAILER)
}

/// Inflate a compressed payload.
///
/// Fails when the deflate stream is damaged or the result does not have the
/// size announced in the header.
pub fn decompress_record(data: &[u8]) -> Result<Vec<u8>, CroError> {
    if !is_compressed(data) {
        return Err(CroError::Parse(
            "Record does not carry the compressed-record trailer".to_string(),
        ));
    }

    let expected = LittleEndian::read_u32(&data[..4]) as usize;
    let stream = &data[COMPRESSED_HEADER_SIZE..data.len() - COMPRESSED_TRAILER.len()];

    // One byte past the announced size is enough to detect a mismatch.
    let mut decoder = DeflateDecoder::new(stream).take(expected as u64 + 1);
    let mut decompressed = Vec::with_capacity(expected.min(stream.len().saturating_mul(8)));
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| CroError::Parse(format!("Cannot inflate record: {}", e)))?;

    if decompressed.len() != expected {
        return Err(CroError::Parse(format!(
            "Inflated record has {} bytes, header announced {}",
            decompressed.len(),
            expected
        )));
    }
    Ok(decompressed)
}
