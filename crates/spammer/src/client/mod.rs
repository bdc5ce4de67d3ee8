//! Block client: keeps the ledger mirror in step with finalized blocks.
//!
//! Leaders push `BlockSync` frames to the generator's client port. Each block
//! is applied to the mirror under the write lock, then its transactions are
//! cleared from the cross-shard registry.

use crate::coordinator::CrossShardCoordinator;
use shardload_ledger::{ApplyOutcome, SharedLedger};
use shardload_network::{InboundListener, InboundMessage, NetworkError};
use shardload_types::Block;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Counters for received blocks.
#[derive(Debug, Default)]
pub struct ClientStats {
    pub blocks: AtomicU64,
    pub applied_txs: AtomicU64,
    pub skipped_txs: AtomicU64,
    pub confirmed_cross_shard: AtomicU64,
}

/// Applies inbound blocks to the shared ledger and confirms cross-shard
/// transactions. Clones share state.
#[derive(Debug, Clone)]
pub struct BlockClient {
    ledger: SharedLedger,
    coordinator: Arc<CrossShardCoordinator>,
    stats: Arc<ClientStats>,
}

impl BlockClient {
    pub fn new(ledger: SharedLedger, coordinator: Arc<CrossShardCoordinator>) -> Self {
        Self {
            ledger,
            coordinator,
            stats: Arc::new(ClientStats::default()),
        }
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// Apply blocks in order. The write lock is taken once per block.
    pub fn handle_blocks(&self, blocks: Vec<Block>) -> ApplyOutcome {
        let mut total = ApplyOutcome::default();
        for block in &blocks {
            let outcome = self.ledger.apply_block(block);
            let confirmed = self.coordinator.confirm_block(block);
            debug!(
                shard = %block.shard,
                height = %block.height,
                applied = outcome.applied,
                skipped = outcome.skipped,
                confirmed,
                "Applied block"
            );

            total.applied += outcome.applied;
            total.skipped += outcome.skipped;
            self.stats.blocks.fetch_add(1, Ordering::Relaxed);
            self.stats
                .applied_txs
                .fetch_add(outcome.applied as u64, Ordering::Relaxed);
            self.stats
                .skipped_txs
                .fetch_add(outcome.skipped as u64, Ordering::Relaxed);
            self.stats
                .confirmed_cross_shard
                .fetch_add(confirmed as u64, Ordering::Relaxed);
        }
        total
    }

    /// Dispatch one inbound message. Anything but block sync is ignored.
    pub fn handle_message(&self, from: SocketAddr, message: InboundMessage) {
        match message {
            InboundMessage::BlockSync(sync) => {
                self.handle_blocks(sync.into_blocks());
            }
            other => trace!(%from, message_type = other.type_name(), "Ignoring message"),
        }
    }

    /// Serve an already-bound listener until `cancel` fires.
    pub fn spawn(&self, listener: InboundListener, cancel: CancellationToken) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(listener.run(cancel, move |from, message| {
            client.handle_message(from, message)
        }))
    }

    /// Bind `0.0.0.0:port` and serve it until `cancel` fires.
    pub async fn listen(
        &self,
        port: u16,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>, NetworkError> {
        let listener = InboundListener::bind(&format!("0.0.0.0:{port}")).await?;
        info!(port, "Listening for finalized blocks");
        Ok(self.spawn(listener, cancel))
    }
}
