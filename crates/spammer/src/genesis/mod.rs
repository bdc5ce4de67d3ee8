//! Genesis summary generation for cluster setup.
//!
//! Nodes and the generator derive genesis locally from the same three
//! parameters. The summary emitted here lets operators check that every node
//! was started with matching parameters by comparing block hashes.

use shardload_ledger::genesis_block;
use shardload_types::ShardGroupId;
use std::fmt::Write;

/// Generate a TOML summary of the genesis block of every shard.
///
/// Output format:
/// ```toml
/// [[genesis.shards]]
/// shard = 0
/// block_hash = "9f1c..."
/// num_addresses = 10000
/// balance = 1000
/// total = 10000000
/// ```
pub fn generate_genesis_toml(
    num_shards: u64,
    num_addresses: u64,
    balance: u64,
) -> Result<String, GenesisError> {
    format_genesis_toml((0..num_shards).map(ShardGroupId), num_addresses, balance, None)
}

/// Generate the genesis summary of one shard only.
pub fn generate_genesis_toml_for_shard(
    num_addresses: u64,
    balance: u64,
    shard: u64,
) -> Result<String, GenesisError> {
    format_genesis_toml([ShardGroupId(shard)], num_addresses, balance, Some(shard))
}

fn format_genesis_toml(
    shards: impl IntoIterator<Item = ShardGroupId>,
    num_addresses: u64,
    balance: u64,
    only: Option<u64>,
) -> Result<String, GenesisError> {
    let total = num_addresses
        .checked_mul(balance)
        .ok_or(GenesisError::Overflow {
            num_addresses,
            balance,
        })?;

    let mut output = String::new();
    writeln!(output, "# Generated genesis for synthetic addresses 0..{num_addresses}")?;
    match only {
        Some(shard) => writeln!(output, "# Shard {shard} only")?,
        None => writeln!(output, "# All shards")?,
    }
    writeln!(output)?;

    for shard in shards {
        let block = genesis_block(shard, num_addresses, balance);
        writeln!(output, "[[genesis.shards]]")?;
        writeln!(output, "shard = {}", shard.0)?;
        writeln!(output, "block_hash = \"{}\"", block.hash())?;
        writeln!(output, "num_addresses = {num_addresses}")?;
        writeln!(output, "balance = {balance}")?;
        writeln!(output, "total = {total}")?;
        writeln!(output)?;
    }

    Ok(output)
}

/// Errors during genesis generation.
#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    #[error("Genesis total overflows: {num_addresses} addresses x {balance}")]
    Overflow { num_addresses: u64, balance: u64 },

    #[error("Formatting failed: {0}")]
    Format(#[from] std::fmt::Error),
}
