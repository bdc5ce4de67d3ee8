//! Per-shard view of the mirrored ledger.

use shardload_types::{Block, BlockHeight, Hash, ShardGroupId, UtxoPool};

/// One shard's UTXO pool plus the position of the last block applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardView {
    pool: UtxoPool,
    height: Option<BlockHeight>,
    last_block_hash: Hash,
}

impl ShardView {
    /// Empty view for `shard`, before any block.
    pub fn new(shard: ShardGroupId) -> Self {
        Self {
            pool: UtxoPool::new(shard),
            height: None,
            last_block_hash: Hash::ZERO,
        }
    }

    /// View over an existing pool.
    pub fn from_pool(pool: UtxoPool) -> Self {
        Self {
            pool,
            height: None,
            last_block_hash: Hash::ZERO,
        }
    }

    /// Shard this view mirrors.
    pub fn shard(&self) -> ShardGroupId {
        self.pool.shard()
    }

    /// Unspent outputs of this shard.
    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    /// Height of the last applied block, if any.
    pub fn height(&self) -> Option<BlockHeight> {
        self.height
    }

    /// Hash of the last applied block, zero before the first.
    pub fn last_block_hash(&self) -> Hash {
        self.last_block_hash
    }

    /// Apply every transaction of `block`, returning how many were applied.
    ///
    /// Transactions spending an output this view does not hold are skipped.
    /// The caller has already checked the block's shard.
    pub(crate) fn apply(&mut self, block: &Block) -> usize {
        let applied = block
            .transactions
            .iter()
            .filter(|tx| self.pool.apply_transaction(tx))
            .count();
        self.height = Some(block.height);
        self.last_block_hash = block.hash();
        applied
    }
}
