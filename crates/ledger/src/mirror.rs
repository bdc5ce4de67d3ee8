//! Mirror of all shards' UTXO pools.

use crate::genesis::genesis_block;
use crate::ShardView;
use shardload_types::{Block, ShardGroupId};
use tracing::{debug, warn};

/// Result of applying one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Transactions whose effects were applied.
    pub applied: usize,
    /// Transactions skipped because a local input was missing.
    pub skipped: usize,
}

impl ApplyOutcome {
    /// Whether the block's shard had no view in the mirror.
    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.skipped == 0
    }
}

/// Every shard's view, in leader order.
///
/// Index `i` holds the shard served by the `i`-th leader of the topology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerMirror {
    views: Vec<ShardView>,
}

impl LedgerMirror {
    /// Empty views for the given shards.
    pub fn new(shards: impl IntoIterator<Item = ShardGroupId>) -> Self {
        Self {
            views: shards.into_iter().map(ShardView::new).collect(),
        }
    }

    /// Mirror built from prepared views.
    pub fn from_views(views: Vec<ShardView>) -> Self {
        Self { views }
    }

    /// Mirror whose shards start with the genesis funding every node uses:
    /// `num_addresses` synthetic addresses holding `balance` each, per shard.
    pub fn with_genesis(
        shards: impl IntoIterator<Item = ShardGroupId>,
        num_addresses: u64,
        balance: u64,
    ) -> Self {
        let mut mirror = Self::new(shards);
        for view in &mut mirror.views {
            let block = genesis_block(view.shard(), num_addresses, balance);
            view.apply(&block);
        }
        mirror
    }

    /// All views, in leader order.
    pub fn views(&self) -> &[ShardView] {
        &self.views
    }

    /// View at leader index `index`.
    pub fn view(&self, index: usize) -> Option<&ShardView> {
        self.views.get(index)
    }

    /// View mirroring `shard`.
    pub fn view_for(&self, shard: ShardGroupId) -> Option<&ShardView> {
        self.views.iter().find(|view| view.shard() == shard)
    }

    /// Number of mirrored shards.
    pub fn num_shards(&self) -> usize {
        self.views.len()
    }

    /// Unspent outputs across all shards.
    pub fn utxo_count(&self) -> usize {
        self.views.iter().map(|view| view.pool().utxo_count()).sum()
    }

    /// Apply a finalized block to the view of its shard.
    ///
    /// For each transaction, local inputs are removed and local outputs added;
    /// a transaction spending an output the view does not hold is skipped.
    /// Blocks for shards with no view are ignored.
    pub fn apply_block(&mut self, block: &Block) -> ApplyOutcome {
        let Some(view) = self.views.iter_mut().find(|view| view.shard() == block.shard) else {
            debug!(shard = %block.shard, height = %block.height, "Ignoring block for unmirrored shard");
            return ApplyOutcome::default();
        };

        let applied = view.apply(block);
        let outcome = ApplyOutcome {
            applied,
            skipped: block.transaction_count() - applied,
        };
        if outcome.skipped > 0 {
            warn!(
                shard = %block.shard,
                height = %block.height,
                skipped = outcome.skipped,
                "Block spends outputs missing from the mirror"
            );
        }
        debug!(
            shard = %block.shard,
            height = %block.height,
            applied = outcome.applied,
            "Applied block"
        );
        outcome
    }
}
