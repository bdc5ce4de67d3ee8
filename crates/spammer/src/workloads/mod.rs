//! Transaction synthesis from mirrored UTXO snapshots.

mod utxo;

pub use utxo::UtxoSpendWorkload;

use rand::RngCore;
use shardload_ledger::ShardView;
use shardload_types::Transaction;

/// Transactions produced by one synthesizer call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesizedBatch {
    /// Spends confined to the origin shard.
    pub intra_shard: Vec<Transaction>,
    /// Spends that also draw on the partner shard.
    pub cross_shard: Vec<Transaction>,
}

impl SynthesizedBatch {
    /// Total transactions in both sequences.
    pub fn len(&self) -> usize {
        self.intra_shard.len() + self.cross_shard.len()
    }

    /// Whether both sequences are empty.
    pub fn is_empty(&self) -> bool {
        self.intra_shard.is_empty() && self.cross_shard.is_empty()
    }
}

/// Source of synthetic transactions.
///
/// Called with the read lock on the ledger held; implementations only read.
///
/// Spent outputs are not removed from the snapshot here. Removal happens when
/// the block that spends them comes back from the leader, so an output can be
/// offered again on the next call if that block has not arrived yet. This is
/// expected for a load generator: the leader rejects the duplicate spend.
pub trait TransactionSynthesizer: Send + Sync {
    /// Generate up to `max_count` transactions spending outputs of
    /// `views[origin]`. Cross-shard spends are only produced when
    /// `cross_shard` is set.
    fn synthesize(
        &self,
        origin: usize,
        views: &[ShardView],
        max_count: usize,
        cross_shard: bool,
        rng: &mut dyn RngCore,
    ) -> SynthesizedBatch;
}
