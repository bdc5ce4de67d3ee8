//! Network messages for the transaction generator.
//!
//! Every message type implements [`NetworkMessage`]; its type id is carried in
//! the wire frame and drives decoding on the receiving side.

pub mod control;
pub mod gossip;
mod outbound;

pub use control::StopMessage;
pub use gossip::{BlockSyncMessage, TransactionListMessage};
pub use outbound::OutboundMessage;

use sbor::prelude::{BasicDecode, BasicEncode};

/// A message that can be framed and sent over the network.
pub trait NetworkMessage: Send + Sync + Sized + BasicEncode + BasicDecode {
    /// Stable identifier written into the wire frame.
    fn message_type_id() -> &'static str;
}
