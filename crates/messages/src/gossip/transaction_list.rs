//! Transaction batch message.

use crate::NetworkMessage;
use shardload_types::{Hash, Transaction};
use sbor::prelude::BasicSbor;

/// A batch of transactions for a leader to order.
///
/// Sent point-to-point for intra-shard batches and broadcast to every leader
/// for the combined cross-shard batch of a tick.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct TransactionListMessage {
    /// The transactions, in generation order.
    pub transactions: Vec<Transaction>,
}

impl TransactionListMessage {
    /// Create a new transaction list message.
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Number of transactions in the batch.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Ids of the carried transactions.
    pub fn transaction_ids(&self) -> Vec<Hash> {
        self.transactions.iter().map(|tx| tx.id()).collect()
    }
}

impl NetworkMessage for TransactionListMessage {
    fn message_type_id() -> &'static str {
        "transaction.list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardload_types::test_utils::test_transaction;

    #[test]
    fn test_transaction_list_ids() {
        let txs = vec![test_transaction(0, 1, 10), test_transaction(0, 2, 20)];
        let expected: Vec<_> = txs.iter().map(|tx| tx.id()).collect();

        let message = TransactionListMessage::new(txs);
        assert_eq!(message.len(), 2);
        assert!(!message.is_empty());
        assert_eq!(message.transaction_ids(), expected);
    }
}
