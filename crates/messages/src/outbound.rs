//! Outbound message types for network communication.

use crate::{NetworkMessage, StopMessage, TransactionListMessage};
use shardload_types::Transaction;

/// Messages the generator sends to leaders and validators.
///
/// The gateway handles the actual network I/O.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// Batch of transactions for a leader.
    TransactionList(TransactionListMessage),

    /// End-of-run notice.
    Stop(StopMessage),
}

impl OutboundMessage {
    /// Encode raw transactions as a transaction-list message.
    pub fn transaction_list(transactions: Vec<Transaction>) -> Self {
        OutboundMessage::TransactionList(TransactionListMessage::new(transactions))
    }

    /// Stop message stamped with the current time.
    pub fn stop() -> Self {
        OutboundMessage::Stop(StopMessage::now())
    }

    /// Wire type id of the wrapped message.
    pub fn message_type_id(&self) -> &'static str {
        match self {
            OutboundMessage::TransactionList(_) => TransactionListMessage::message_type_id(),
            OutboundMessage::Stop(_) => StopMessage::message_type_id(),
        }
    }

    /// Get a human-readable name for this message type.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::TransactionList(_) => "TransactionList",
            OutboundMessage::Stop(_) => "Stop",
        }
    }

    /// Number of transactions carried (zero for control messages).
    pub fn transaction_count(&self) -> usize {
        match self {
            OutboundMessage::TransactionList(list) => list.len(),
            OutboundMessage::Stop(_) => 0,
        }
    }

    /// Take back the carried transactions (empty for control messages).
    pub fn into_transactions(self) -> Vec<Transaction> {
        match self {
            OutboundMessage::TransactionList(list) => list.transactions,
            OutboundMessage::Stop(_) => Vec::new(),
        }
    }

    /// Check if this is a process control message.
    pub fn is_control(&self) -> bool {
        matches!(self, OutboundMessage::Stop(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardload_types::test_utils::test_transaction;

    #[test]
    fn test_transaction_list_constructor() {
        let message = OutboundMessage::transaction_list(vec![test_transaction(1, 3, 70)]);
        assert_eq!(message.type_name(), "TransactionList");
        assert_eq!(message.message_type_id(), "transaction.list");
        assert_eq!(message.transaction_count(), 1);
        assert!(!message.is_control());
    }

    #[test]
    fn test_into_transactions() {
        let tx = test_transaction(0, 4, 10);
        let message = OutboundMessage::transaction_list(vec![tx.clone()]);
        assert_eq!(message.into_transactions(), vec![tx]);
        assert!(OutboundMessage::stop().into_transactions().is_empty());
    }

    #[test]
    fn test_stop_constructor() {
        let message = OutboundMessage::stop();
        assert_eq!(message.message_type_id(), "node.stop");
        assert_eq!(message.transaction_count(), 0);
        assert!(message.is_control());
        match message {
            OutboundMessage::Stop(stop) => assert!(stop.issued_at_ms > 0),
            other => panic!("Expected Stop, got {}", other.type_name()),
        }
    }
}
