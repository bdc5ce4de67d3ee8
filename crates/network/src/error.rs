//! Network error type.

use crate::{CodecError, FrameError};
use shardload_types::Peer;
use std::io;
use thiserror::Error;

/// Errors from the TCP gateway and inbound listener.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no tokio runtime available")]
    NoRuntime,

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("failed to connect to {peer}: {source}")]
    Connect { peer: Peer, source: io::Error },

    #[error("timed out talking to {0}")]
    Timeout(Peer),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
