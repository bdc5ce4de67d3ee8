//! Registry of dispatched cross-shard transactions awaiting confirmation.

use parking_lot::Mutex;
use shardload_types::{Block, Hash, Transaction};
use std::collections::HashMap;

/// Pending cross-shard transactions, keyed by id.
///
/// Guarded by its own lock, independent of the ledger lock, so the dispatch
/// loop can register while the block client confirms. Entries have no expiry;
/// anything never confirmed stays for the life of the process.
#[derive(Debug, Default)]
pub struct CrossShardCoordinator {
    pending: Mutex<HashMap<Hash, Transaction>>,
}

impl CrossShardCoordinator {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dispatched transaction. Overwrites an entry with the same id
    /// and returns it.
    pub fn register_pending(&self, tx: Transaction) -> Option<Transaction> {
        self.pending.lock().insert(tx.id(), tx)
    }

    /// Register a batch under one lock acquisition. Returns the batch size.
    pub fn register_all(&self, txs: impl IntoIterator<Item = Transaction>) -> usize {
        let mut pending = self.pending.lock();
        let mut count = 0;
        for tx in txs {
            pending.insert(tx.id(), tx);
            count += 1;
        }
        count
    }

    /// Remove a confirmed transaction.
    pub fn confirm(&self, tx_id: &Hash) -> Option<Transaction> {
        self.pending.lock().remove(tx_id)
    }

    /// Remove every pending transaction included in `block`. Returns how many
    /// were removed.
    pub fn confirm_block(&self, block: &Block) -> usize {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return 0;
        }
        block
            .transactions
            .iter()
            .filter(|tx| pending.remove(&tx.id()).is_some())
            .count()
    }

    /// Number of transactions awaiting confirmation.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether `tx_id` is awaiting confirmation.
    pub fn contains(&self, tx_id: &Hash) -> bool {
        self.pending.lock().contains_key(tx_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardload_types::test_utils::test_transaction;
    use shardload_types::{BlockHeight, ShardGroupId};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_register_overwrite_confirm() {
        let coordinator = CrossShardCoordinator::new();
        let tx = test_transaction(0, 1, 50);

        assert!(coordinator.register_pending(tx.clone()).is_none());
        assert_eq!(coordinator.register_pending(tx.clone()), Some(tx.clone()));
        assert_eq!(coordinator.pending_count(), 1);
        assert!(coordinator.contains(&tx.id()));

        assert_eq!(coordinator.confirm(&tx.id()), Some(tx.clone()));
        assert_eq!(coordinator.confirm(&tx.id()), None);
        assert_eq!(coordinator.pending_count(), 0);
    }

    #[test]
    fn test_confirm_block() {
        let coordinator = CrossShardCoordinator::new();
        let pending: Vec<_> = (1..=3).map(|seed| test_transaction(0, seed, 10)).collect();
        assert_eq!(coordinator.register_all(pending.clone()), 3);

        let block = Block::new(
            ShardGroupId(1),
            BlockHeight(4),
            Hash::ZERO,
            vec![pending[0].clone(), test_transaction(1, 9, 1), pending[2].clone()],
        );
        assert_eq!(coordinator.confirm_block(&block), 2);
        assert_eq!(coordinator.pending_count(), 1);
        assert!(coordinator.contains(&pending[1].id()));
    }

    #[test]
    fn test_concurrent_register_and_confirm() {
        let coordinator = Arc::new(CrossShardCoordinator::new());
        let txs: Vec<_> = (0..200u8).map(|seed| test_transaction(0, seed, 1)).collect();

        let registrar = {
            let coordinator = coordinator.clone();
            let txs = txs.clone();
            thread::spawn(move || {
                for tx in txs {
                    coordinator.register_pending(tx);
                }
            })
        };
        let confirmer = {
            let coordinator = coordinator.clone();
            let ids: Vec<_> = txs.iter().map(|tx| tx.id()).collect();
            thread::spawn(move || {
                // Confirms may race ahead of registration; retry until all land.
                let mut remaining = ids;
                while !remaining.is_empty() {
                    remaining.retain(|id| coordinator.confirm(id).is_none());
                    thread::yield_now();
                }
            })
        };

        registrar.join().unwrap();
        confirmer.join().unwrap();
        assert_eq!(coordinator.pending_count(), 0);
    }
}
