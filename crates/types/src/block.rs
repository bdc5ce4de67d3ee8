//! Finalized shard blocks as reported by leaders.

use crate::{BlockHeight, Hash, ShardGroupId, Transaction};
use sbor::prelude::*;

/// A finalized block of one shard.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Block {
    /// Shard that finalized the block.
    pub shard: ShardGroupId,

    /// Block height in the shard's chain (genesis = 0).
    pub height: BlockHeight,

    /// Hash of parent block.
    pub parent_hash: Hash,

    /// Transactions included in this block.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create a block over the given transactions.
    pub fn new(
        shard: ShardGroupId,
        height: BlockHeight,
        parent_hash: Hash,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            shard,
            height,
            parent_hash,
            transactions,
        }
    }

    /// Hash over the header fields and the ordered transaction ids.
    pub fn hash(&self) -> Hash {
        let mut bytes = Vec::with_capacity(48 + self.transactions.len() * Hash::BYTES);
        bytes.extend_from_slice(&self.shard.0.to_le_bytes());
        bytes.extend_from_slice(&self.height.0.to_le_bytes());
        bytes.extend_from_slice(self.parent_hash.as_bytes());
        for tx in &self.transactions {
            bytes.extend_from_slice(tx.id().as_bytes());
        }
        Hash::from_bytes(&bytes)
    }

    /// Get number of transactions in this block.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Transaction ids in block order.
    pub fn transaction_ids(&self) -> Vec<Hash> {
        self.transactions.iter().map(|tx| tx.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Address;

    #[test]
    fn test_block_hash_covers_transactions() {
        let tx = Transaction::coinbase(Address::synthetic(0), 1000, ShardGroupId(0));
        let empty = Block::new(ShardGroupId(0), BlockHeight(1), Hash::ZERO, vec![]);
        let full = Block::new(ShardGroupId(0), BlockHeight(1), Hash::ZERO, vec![tx.clone()]);

        assert_eq!(empty.hash(), empty.clone().hash());
        assert_ne!(empty.hash(), full.hash());
        assert_eq!(full.transaction_ids(), vec![tx.id()]);
    }
}
