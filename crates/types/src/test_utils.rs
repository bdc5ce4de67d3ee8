//! Fixtures shared by the tests of downstream crates.

use crate::{Address, Hash, ShardGroupId, Transaction, TxInput, TxOutput, UtxoPool};

/// Deterministic transaction id for fixture UTXOs.
pub fn test_tx_id(seed: u8) -> Hash {
    Hash::from_raw([seed; 32])
}

/// Build a pool from `(address, tx id seed, output index, value)` entries.
pub fn test_pool(shard: u64, entries: &[(&str, u8, u32, u64)]) -> UtxoPool {
    let mut pool = UtxoPool::new(ShardGroupId(shard));
    for &(address, seed, index, value) in entries {
        pool.insert(Address::from(address), &test_tx_id(seed), index, value);
    }
    pool
}

/// Single-input, single-output transfer on one shard.
pub fn test_transaction(shard: u64, seed: u8, value: u64) -> Transaction {
    let shard = ShardGroupId(shard);
    Transaction::new(
        vec![TxInput {
            tx_id: test_tx_id(seed),
            output_index: 0,
            address: Address::from("A"),
            shard,
        }],
        vec![TxOutput {
            value,
            address: Address::synthetic(u64::from(seed)),
            shard,
        }],
    )
}
