//! Message encoding and decoding for network transport.
//!
//! # Wire Format
//!
//! Every message travels inside a [`Frame`] carrying its type id, so a single
//! TCP port can receive any message kind:
//!
//! ```text
//! LZ4( SBOR( Frame { message_type, payload: SBOR(message) } ) )
//! ```
//!
//! Decoding dispatches on `message_type`.

use crate::wire;
use sbor::prelude::BasicSbor;
use shardload_messages::{
    BlockSyncMessage, NetworkMessage, OutboundMessage, StopMessage, TransactionListMessage,
};
use thiserror::Error;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Message too short")]
    MessageTooShort,

    #[error("SBOR decode error: {0}")]
    SborDecode(String),

    #[error("SBOR encode error: {0}")]
    SborEncode(String),

    #[error("Decompression error: {0}")]
    Decompress(String),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),
}

/// Envelope written on the wire.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
struct Frame {
    message_type: String,
    payload: Vec<u8>,
}

/// A message received from a leader or another generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    TransactionList(TransactionListMessage),
    Stop(StopMessage),
    BlockSync(BlockSyncMessage),
}

impl InboundMessage {
    /// Get a human-readable name for this message type.
    pub fn type_name(&self) -> &'static str {
        match self {
            InboundMessage::TransactionList(_) => "TransactionList",
            InboundMessage::Stop(_) => "Stop",
            InboundMessage::BlockSync(_) => "BlockSync",
        }
    }
}

/// Encode any network message to wire format.
pub fn encode_to_wire<M: NetworkMessage>(message: &M) -> Result<Vec<u8>, CodecError> {
    let payload =
        sbor::basic_encode(message).map_err(|e| CodecError::SborEncode(format!("{:?}", e)))?;
    let frame = Frame {
        message_type: M::message_type_id().to_string(),
        payload,
    };
    let sbor_bytes =
        sbor::basic_encode(&frame).map_err(|e| CodecError::SborEncode(format!("{:?}", e)))?;

    Ok(wire::compress(&sbor_bytes))
}

/// Encode an outbound message to wire format.
pub fn encode_message(message: &OutboundMessage) -> Result<Vec<u8>, CodecError> {
    match message {
        OutboundMessage::TransactionList(list) => encode_to_wire(list),
        OutboundMessage::Stop(stop) => encode_to_wire(stop),
    }
}

/// Decode a message from wire format.
///
/// LZ4-decompresses, SBOR-decodes the frame, then decodes the payload as the
/// type named by the frame.
pub fn decode_message(data: &[u8]) -> Result<InboundMessage, CodecError> {
    if data.is_empty() {
        return Err(CodecError::MessageTooShort);
    }

    let bytes = wire::decompress(data).map_err(|e| CodecError::Decompress(e.to_string()))?;
    let frame: Frame =
        sbor::basic_decode(&bytes).map_err(|e| CodecError::SborDecode(format!("{:?}", e)))?;

    match frame.message_type.as_str() {
        t if t == TransactionListMessage::message_type_id() => {
            Ok(InboundMessage::TransactionList(decode_payload(&frame.payload)?))
        }
        t if t == StopMessage::message_type_id() => {
            Ok(InboundMessage::Stop(decode_payload(&frame.payload)?))
        }
        t if t == BlockSyncMessage::message_type_id() => {
            Ok(InboundMessage::BlockSync(decode_payload(&frame.payload)?))
        }
        _ => Err(CodecError::UnknownMessageType(frame.message_type)),
    }
}

fn decode_payload<M: NetworkMessage>(payload: &[u8]) -> Result<M, CodecError> {
    sbor::basic_decode(payload).map_err(|e| CodecError::SborDecode(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardload_types::test_utils::test_transaction;
    use shardload_types::{Block, BlockHeight, Hash, ShardGroupId};

    #[test]
    fn test_transaction_list_roundtrip() {
        let txs = vec![test_transaction(0, 1, 50), test_transaction(1, 2, 20)];
        let message = OutboundMessage::transaction_list(txs.clone());

        let bytes = encode_message(&message).unwrap();
        match decode_message(&bytes).unwrap() {
            InboundMessage::TransactionList(list) => {
                assert_eq!(list.transactions, txs);
                assert_eq!(list.transaction_ids(), vec![txs[0].id(), txs[1].id()]);
            }
            other => panic!("Expected TransactionList, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_stop_roundtrip() {
        let stop = StopMessage { issued_at_ms: 42 };
        let bytes = encode_message(&OutboundMessage::Stop(stop.clone())).unwrap();
        assert_eq!(decode_message(&bytes).unwrap(), InboundMessage::Stop(stop));
    }

    #[test]
    fn test_block_sync_decode() {
        let block = Block::new(
            ShardGroupId(1),
            BlockHeight(7),
            Hash::ZERO,
            vec![test_transaction(1, 9, 30)],
        );
        let bytes = encode_to_wire(&BlockSyncMessage::new(vec![block.clone()])).unwrap();

        match decode_message(&bytes).unwrap() {
            InboundMessage::BlockSync(sync) => assert_eq!(sync.into_blocks(), vec![block]),
            other => panic!("Expected BlockSync, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_unknown_message_type() {
        let frame = Frame {
            message_type: "bft.vote".to_string(),
            payload: vec![1, 2, 3],
        };
        let bytes = wire::compress(&sbor::basic_encode(&frame).unwrap());
        let result = decode_message(&bytes);
        assert!(matches!(result, Err(CodecError::UnknownMessageType(t)) if t == "bft.vote"));
    }

    #[test]
    fn test_payload_type_mismatch() {
        // Stop payload labelled as a block sync.
        let frame = Frame {
            message_type: BlockSyncMessage::message_type_id().to_string(),
            payload: sbor::basic_encode(&StopMessage { issued_at_ms: 1 }).unwrap(),
        };
        let bytes = wire::compress(&sbor::basic_encode(&frame).unwrap());
        assert!(matches!(decode_message(&bytes), Err(CodecError::SborDecode(_))));
    }

    #[test]
    fn test_corrupt_data() {
        assert!(matches!(decode_message(&[]), Err(CodecError::MessageTooShort)));
        assert!(matches!(
            decode_message(&[4, 0, 0, 0, 0xf0]),
            Err(CodecError::Decompress(_))
        ));
        let garbage = wire::compress(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(decode_message(&garbage), Err(CodecError::SborDecode(_))));
    }
}
