//! Genesis funding of the synthetic address space.
//!
//! Every node derives the same genesis locally: one coinbase per synthetic
//! address `0..N` per shard. Coinbase ids depend on address, value and shard
//! only, so the generator's mirror agrees with the leaders without exchanging
//! any state.

use shardload_types::{Address, Block, BlockHeight, Hash, ShardGroupId, Transaction};

/// Coinbase transactions funding addresses `0..num_addresses` on `shard`.
pub fn genesis_transactions(shard: ShardGroupId, num_addresses: u64, balance: u64) -> Vec<Transaction> {
    (0..num_addresses)
        .map(|id| Transaction::coinbase(Address::synthetic(id), balance, shard))
        .collect()
}

/// Genesis block for `shard`.
pub fn genesis_block(shard: ShardGroupId, num_addresses: u64, balance: u64) -> Block {
    Block::new(
        shard,
        BlockHeight::GENESIS,
        Hash::ZERO,
        genesis_transactions(shard, num_addresses, balance),
    )
}
