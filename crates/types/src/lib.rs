//! Core types for the shardload transaction generator.
//!
//! - [`Hash`]: Blake3 digest used for transaction ids and block hashes
//! - [`ShardGroupId`], [`BlockHeight`], [`Address`], [`Peer`]: identifiers
//! - [`UtxoPool`]: per-shard unspent output snapshot
//! - [`Transaction`], [`TxInput`], [`TxOutput`]: UTXO transactions
//! - [`Block`]: finalized shard blocks reported by leaders

mod block;
mod hash;
mod identifiers;
mod transaction;
mod utxo;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use block::Block;
pub use hash::{Hash, HexError};
pub use identifiers::{Address, BlockHeight, Peer, ShardGroupId};
pub use transaction::{Transaction, TxInput, TxOutput, UtxoRef};
pub use utxo::{OutputMap, UtxoPool};
