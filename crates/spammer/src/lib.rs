//! Synthetic UTXO load generator for a sharded test network.
//!
//! # Modules
//!
//! - [`topology`]: leader/validator layout file
//! - [`config`]: run parameters and the optional settings file
//! - [`workloads`]: transaction synthesis from mirrored UTXO snapshots
//! - [`coordinator`]: registry of in-flight cross-shard transactions
//! - [`runner`]: the timed dispatch loop and its report
//! - [`client`]: applies finalized blocks pushed back by leaders
//! - [`genesis`]: genesis summary for cluster setup

pub mod client;
pub mod config;
pub mod coordinator;
pub mod genesis;
pub mod runner;
pub mod topology;
pub mod workloads;

pub use client::BlockClient;
pub use config::{ConfigError, SettingsFile, SpammerConfig};
pub use coordinator::CrossShardCoordinator;
pub use runner::{DispatchLoop, LoopState, SpammerError, SpammerReport};
pub use topology::{LeaderNode, NetworkLayout};
pub use workloads::{SynthesizedBatch, TransactionSynthesizer, UtxoSpendWorkload};
