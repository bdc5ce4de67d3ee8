//! Network plumbing for the load generator.
//!
//! # Modules
//!
//! - [`wire`]: LZ4 compression of frame bodies
//! - [`codec`]: SBOR frame encoding and type-id dispatch
//! - [`framing`]: 4-byte length-prefixed stream frames
//! - [`NetworkGateway`]: fire-and-forget outbound delivery
//! - [`TcpGateway`]: TCP implementation, one connection per delivery
//! - [`InboundListener`]: TCP listener decoding inbound frames
//! - [`RecordingGateway`]: in-memory gateway for tests and dry runs

pub mod codec;
mod error;
pub mod framing;
mod listener;
mod memory;
mod tcp;
mod traits;
pub mod wire;

pub use codec::{decode_message, encode_message, encode_to_wire, CodecError, InboundMessage};
pub use error::NetworkError;
pub use framing::FrameError;
pub use listener::InboundListener;
pub use memory::{OutboxEntry, RecordingGateway, SendTarget};
pub use tcp::{GatewayStats, TcpGateway, TcpGatewayConfig};
pub use traits::NetworkGateway;
pub use wire::{compress, decompress, WireError};
