//! Wire format compression for network messages.
//!
//! All frames are LZ4-compressed with the uncompressed size prepended, so
//! decompression can pre-allocate the output buffer.

use thiserror::Error;

/// Errors from wire encoding/decoding.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),
}

/// Compress data for transmission over the network.
#[inline]
pub fn compress(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress data received from the network.
#[inline]
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, WireError> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| WireError::DecompressionFailed(e.to_string()))
}
