//! Messages carrying ledger data: transaction batches out, finalized blocks in.

mod block_sync;
mod transaction_list;

pub use block_sync::BlockSyncMessage;
pub use transaction_list::TransactionListMessage;
