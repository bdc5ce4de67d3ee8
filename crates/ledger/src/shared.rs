//! The single lock over the mirrored snapshot set.

use crate::{ApplyOutcome, LedgerMirror};
use parking_lot::{RwLock, RwLockReadGuard};
use shardload_types::Block;
use std::sync::Arc;

/// Shared, lock-guarded ledger mirror.
///
/// Synthesis takes the read side for the duration of one traversal; block
/// application takes the write side for one block. Neither is ever held
/// across network I/O. Clones share the same mirror.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<LedgerMirror>>,
}

impl SharedLedger {
    /// Wrap a mirror.
    pub fn new(mirror: LedgerMirror) -> Self {
        Self {
            inner: Arc::new(RwLock::new(mirror)),
        }
    }

    /// Acquire the read lock.
    pub fn read(&self) -> RwLockReadGuard<'_, LedgerMirror> {
        self.inner.read()
    }

    /// Apply one block under the write lock.
    pub fn apply_block(&self, block: &Block) -> ApplyOutcome {
        self.inner.write().apply_block(block)
    }

    /// Apply blocks in order, taking the write lock once per block.
    pub fn apply_blocks(&self, blocks: &[Block]) -> ApplyOutcome {
        blocks.iter().fold(ApplyOutcome::default(), |total, block| {
            let outcome = self.apply_block(block);
            ApplyOutcome {
                applied: total.applied + outcome.applied,
                skipped: total.skipped + outcome.skipped,
            }
        })
    }

    /// Unspent outputs across all shards.
    pub fn utxo_count(&self) -> usize {
        self.inner.read().utxo_count()
    }
}
