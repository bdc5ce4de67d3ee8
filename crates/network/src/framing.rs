//! Length-prefixed stream framing.
//!
//! Shared by the TCP gateway (writer) and the inbound listener (reader) so the
//! two sides cannot drift apart.
//!
//! # Wire format
//!
//! ```text
//! [4-byte big-endian length][LZ4-compressed SBOR frame]
//! ```
//!
//! Frame bodies arrive already encoded by [`crate::codec`]; this module only
//! deals with the length prefix.

use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame body size (compressed).
///
/// A full tick for one leader can carry 100k transactions, so this is well
/// above the usual gossip limit.
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024; // 64 MB

/// Errors from framing operations.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("frame too large: {0} bytes")]
    TooLarge(usize),
}

impl FrameError {
    /// Whether the peer closed the stream cleanly between frames.
    pub fn is_eof(&self) -> bool {
        matches!(self, FrameError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Write `data` as one length-prefixed frame and flush.
pub async fn write_frame<S: AsyncWrite + Unpin>(stream: &mut S, data: &[u8]) -> Result<(), FrameError> {
    if data.len() > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge(data.len()));
    }
    let len = data.len() as u32;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(data).await?;
    stream.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame body.
pub async fn read_frame<S: AsyncRead + Unpin>(
    stream: &mut S,
    max_size: usize,
) -> Result<Vec<u8>, FrameError> {
    let len = read_frame_len(stream, max_size).await?;

    let mut data = vec![0u8; len];
    stream.read_exact(&mut data).await?;
    Ok(data)
}

/// Read the 4-byte length prefix and validate against `max_size`.
pub async fn read_frame_len<S: AsyncRead + Unpin>(
    stream: &mut S,
    max_size: usize,
) -> Result<usize, FrameError> {
    let mut len_bytes = [0u8; 4];
    stream.read_exact(&mut len_bytes).await?;
    let len = u32::from_be_bytes(len_bytes) as usize;

    if len > max_size {
        return Err(FrameError::TooLarge(len));
    }

    Ok(len)
}
