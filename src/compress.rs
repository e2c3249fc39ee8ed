//! LZF compression envelope helpers.
//!
//! The envelope wraps a whole encoded payload: the tag byte gets its top
//! bit set, a signed 32-bit big-endian uncompressed-body-length prefix
//! follows, and the rest is the LZF-compressed untagged body. Nested
//! values are never individually compressed.

use crate::error::{Error, Result};
use crate::tag::COMPRESSED;

/// Bodies this short are never worth wrapping: the envelope itself costs
/// four bytes of length prefix, so the compressed body must come in at
/// least five bytes under the original to shrink the payload.
const THRESHOLD: usize = 5;

/// Attempt to wrap an encoded payload (tag byte plus body) in a
/// compression envelope. Returns `None` when the body is too short, too
/// long for the signed length prefix, or doesn't compress enough to pay
/// for the envelope.
pub(crate) fn envelope(encoded: &[u8]) -> Option<Vec<u8>> {
    let (tag, body) = encoded.split_first()?;
    if body.len() <= THRESHOLD || body.len() > i32::MAX as usize {
        return None;
    }
    let compressed = lzf::compress(body).ok()?;
    if compressed.len() > body.len() - THRESHOLD {
        return None;
    }
    let mut out = Vec::with_capacity(5 + compressed.len());
    out.push(*tag | COMPRESSED);
    out.extend_from_slice(&(body.len() as i32).to_be_bytes());
    out.extend_from_slice(&compressed);
    Some(out)
}

/// Decompress an envelope body to exactly `len` bytes.
pub(crate) fn expand(data: &[u8], len: usize) -> Result<Vec<u8>> {
    let out = lzf::decompress(data, len).map_err(|e| Error::Compression(format!("{:?}", e)))?;
    if out.len() != len {
        return Err(Error::Compression(format!(
            "decompressed to {} bytes, expected {}",
            out.len(),
            len
        )));
    }
    Ok(out)
}
