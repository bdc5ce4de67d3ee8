//! Ledger mirror for the load generator.
//!
//! The generator keeps its own copy of every shard's UTXO pool. Synthesis
//! reads it; finalized blocks reported by leaders update it. Both sides go
//! through [`SharedLedger`], the single lock over the whole snapshot set.

mod genesis;
mod mirror;
mod shared;
mod view;

pub use genesis::{genesis_block, genesis_transactions};
pub use mirror::{ApplyOutcome, LedgerMirror};
pub use shared::SharedLedger;
pub use view::ShardView;
