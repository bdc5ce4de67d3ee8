//! Dispatch loop that paces generation against the leaders.

mod report;

pub use report::{GenerationSummary, GenerationTimer, SpammerReport, SpammerStats};

use crate::config::{ConfigError, SpammerConfig};
use crate::coordinator::CrossShardCoordinator;
use crate::topology::NetworkLayout;
use crate::workloads::TransactionSynthesizer;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shardload_ledger::SharedLedger;
use shardload_messages::OutboundMessage;
use shardload_network::{NetworkError, NetworkGateway};
use shardload_types::Peer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};

/// Lifecycle of a [`DispatchLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Created, or ticking.
    Running,
    /// Duration elapsed; the stop broadcast is going out.
    Stopping,
    /// Stop sent; the loop has exited.
    Terminated,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Intra-shard transactions sent, summed over leaders.
    pub intra_shard: usize,
    /// Cross-shard transactions in the tick's broadcast.
    pub cross_shard: usize,
    /// Whether a cross-shard broadcast went out.
    pub broadcast: bool,
}

/// Periodic driver: synthesize per leader, send, broadcast cross-shard, sleep.
///
/// Leader `i` is bound to ledger view `i`. The ledger read lock is held only
/// while synthesizing for one leader and is released before that leader's
/// batch is sent. Sends are fire-and-forget, so the loop only suspends at the
/// tick delay.
pub struct DispatchLoop<S, G> {
    config: SpammerConfig,
    leaders: Vec<Peer>,
    stop_peers: Vec<Peer>,
    ledger: SharedLedger,
    synthesizer: S,
    gateway: G,
    coordinator: Arc<CrossShardCoordinator>,
    rng: Box<dyn RngCore + Send>,
    stats: SpammerStats,
    timer: GenerationTimer,
    state: LoopState,
}

impl<S, G> DispatchLoop<S, G>
where
    S: TransactionSynthesizer,
    G: NetworkGateway,
{
    /// Create a loop for the leaders and stop targets of `layout`.
    pub fn new(
        config: SpammerConfig,
        layout: &NetworkLayout,
        ledger: SharedLedger,
        synthesizer: S,
        gateway: G,
        coordinator: Arc<CrossShardCoordinator>,
    ) -> Result<Self, SpammerError> {
        config.validate()?;
        if layout.num_shards() == 0 {
            return Err(ConfigError::NoLeaders.into());
        }
        if !layout.has_contiguous_shards() {
            return Err(ConfigError::Invalid(format!(
                "leader shard ids {:?} are not 0..{}",
                layout.shard_ids(),
                layout.num_shards()
            ))
            .into());
        }
        let views = ledger.read().num_shards();
        if views != layout.num_shards() {
            return Err(SpammerError::ShardMismatch {
                leaders: layout.num_shards(),
                views,
            });
        }

        let seed = config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        });
        let timer = GenerationTimer::new().map_err(|e| SpammerError::Metrics(e.to_string()))?;

        Ok(Self {
            leaders: layout.leader_peers(),
            stop_peers: layout.stop_targets(),
            config,
            ledger,
            synthesizer,
            gateway,
            coordinator,
            rng: Box::new(ChaCha8Rng::seed_from_u64(seed)),
            stats: SpammerStats::default(),
            timer,
            state: LoopState::Running,
        })
    }

    /// Replace the random source.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Counters so far.
    pub fn stats(&self) -> &SpammerStats {
        &self.stats
    }

    /// The gateway messages are sent through.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// One GENERATE, SEND, BROADCAST pass over every leader.
    pub fn run_tick(&mut self) -> TickSummary {
        let mut summary = TickSummary::default();
        let mut all_cross = Vec::new();

        for (index, leader) in self.leaders.iter().enumerate() {
            let started = std::time::Instant::now();
            let batch = {
                let mirror = self.ledger.read();
                self.synthesizer.synthesize(
                    index,
                    mirror.views(),
                    self.config.max_txs_per_tick,
                    self.config.cross_shard,
                    &mut *self.rng,
                )
            };
            self.timer.record(started.elapsed());

            debug!(
                leader = %leader,
                num_txs = batch.intra_shard.len(),
                num_cross_txs = batch.cross_shard.len(),
                "Sending single-shard transactions"
            );
            summary.intra_shard += batch.intra_shard.len();
            self.gateway
                .send(leader, &OutboundMessage::transaction_list(batch.intra_shard));
            all_cross.extend(batch.cross_shard);
        }

        if !all_cross.is_empty() {
            debug!(num_cross_txs = all_cross.len(), "Broadcasting cross-shard transactions");
            summary.cross_shard = all_cross.len();
            summary.broadcast = true;
            let message = OutboundMessage::transaction_list(all_cross);
            self.gateway.broadcast(&self.leaders, &message);
            self.coordinator.register_all(message.into_transactions());
            self.stats.broadcasts.fetch_add(1, Ordering::Relaxed);
        }

        self.stats.ticks.fetch_add(1, Ordering::Relaxed);
        self.stats
            .intra_shard_sent
            .fetch_add(summary.intra_shard as u64, Ordering::Relaxed);
        self.stats
            .cross_shard_sent
            .fetch_add(summary.cross_shard as u64, Ordering::Relaxed);
        summary
    }

    /// Wait out the warm-up, tick until the run duration has elapsed, then
    /// broadcast the stop message once.
    pub async fn run(&mut self) -> SpammerReport {
        if !self.config.warmup.is_zero() {
            info!(warmup_secs = self.config.warmup.as_secs_f64(), "Waiting for nodes to be ready");
            tokio::time::sleep(self.config.warmup).await;
        }

        info!(
            leaders = self.leaders.len(),
            max_txs_per_tick = self.config.max_txs_per_tick,
            tick_interval_ms = self.config.tick_interval.as_millis() as u64,
            run_duration_secs = self.config.run_duration.as_secs_f64(),
            cross_shard = self.config.cross_shard,
            "Starting generator"
        );

        let start = Instant::now();
        let mut last_progress = start;
        self.state = LoopState::Running;

        loop {
            let elapsed = start.elapsed();
            if elapsed >= self.config.run_duration {
                debug!(elapsed_ms = elapsed.as_millis() as u64, "Generator timer ended");
                break;
            }

            self.run_tick();

            if last_progress.elapsed() >= self.config.progress_interval {
                self.log_progress(start.elapsed());
                last_progress = Instant::now();
            }

            tokio::time::sleep(self.config.tick_interval).await;
        }

        self.state = LoopState::Stopping;
        info!(peers = self.stop_peers.len(), "Broadcasting stop message");
        self.gateway.broadcast(&self.stop_peers, &OutboundMessage::stop());
        self.state = LoopState::Terminated;

        let report = self.report(start.elapsed());
        self.log_progress(start.elapsed());
        report
    }

    fn log_progress(&self, elapsed: std::time::Duration) {
        info!(
            elapsed_secs = elapsed.as_secs(),
            ticks = self.stats.ticks.load(Ordering::Relaxed),
            intra_shard = self.stats.intra_shard_sent.load(Ordering::Relaxed),
            cross_shard = self.stats.cross_shard_sent.load(Ordering::Relaxed),
            pending = self.coordinator.pending_count(),
            utxos = self.ledger.utxo_count(),
            tps = format!("{:.0}", self.stats.tps(elapsed)),
            "Generator progress"
        );
    }

    fn report(&self, elapsed: std::time::Duration) -> SpammerReport {
        SpammerReport {
            duration_secs: elapsed.as_secs_f64(),
            ticks: self.stats.ticks.load(Ordering::Relaxed),
            intra_shard_sent: self.stats.intra_shard_sent.load(Ordering::Relaxed),
            cross_shard_sent: self.stats.cross_shard_sent.load(Ordering::Relaxed),
            cross_shard_broadcasts: self.stats.broadcasts.load(Ordering::Relaxed),
            pending_cross_shard: self.coordinator.pending_count(),
            stop_peers: self.stop_peers.len(),
            generation: self.timer.summary(),
            avg_tps: self.stats.tps(elapsed),
        }
    }
}

/// Errors that can occur setting up or running the generator.
#[derive(Debug, thiserror::Error)]
pub enum SpammerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("{leaders} leaders but {views} mirrored shards")]
    ShardMismatch { leaders: usize, views: usize },

    #[error("Metrics error: {0}")]
    Metrics(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::LeaderNode;
    use crate::workloads::{SynthesizedBatch, UtxoSpendWorkload};
    use rand::rngs::mock::StepRng;
    use shardload_ledger::{LedgerMirror, ShardView};
    use shardload_network::RecordingGateway;
    use shardload_types::test_utils::{test_pool, test_transaction};
    use shardload_types::{ShardGroupId, Transaction};
    use std::time::Duration;
    use tracing_test::traced_test;

    /// Returns the same batch for every origin.
    struct FixedSynthesizer {
        intra: Vec<Transaction>,
        cross: Vec<Transaction>,
    }

    impl TransactionSynthesizer for FixedSynthesizer {
        fn synthesize(
            &self,
            _origin: usize,
            _views: &[ShardView],
            _max_count: usize,
            _cross_shard: bool,
            _rng: &mut dyn RngCore,
        ) -> SynthesizedBatch {
            SynthesizedBatch {
                intra_shard: self.intra.clone(),
                cross_shard: self.cross.clone(),
            }
        }
    }

    fn layout() -> NetworkLayout {
        NetworkLayout::new(
            vec![
                LeaderNode {
                    peer: Peer::new("10.0.0.1", 9000),
                    shard: ShardGroupId(0),
                },
                LeaderNode {
                    peer: Peer::new("10.0.0.2", 9000),
                    shard: ShardGroupId(1),
                },
            ],
            vec![Peer::new("10.0.0.3", 9001), Peer::new("10.0.0.4", 9001)],
            None,
        )
    }

    fn ledger() -> SharedLedger {
        SharedLedger::new(LedgerMirror::from_views(vec![
            ShardView::from_pool(test_pool(0, &[("A", 1, 0, 50)])),
            ShardView::from_pool(test_pool(1, &[("A", 2, 0, 20)])),
        ]))
    }

    fn one_tick_config() -> SpammerConfig {
        SpammerConfig::new(2)
            .with_warmup(Duration::ZERO)
            .with_tick_interval(Duration::from_millis(500))
            .with_run_duration(Duration::from_millis(500))
            .with_seed(1)
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_tick_run() {
        let synthesizer = FixedSynthesizer {
            intra: vec![test_transaction(0, 1, 50)],
            cross: vec![test_transaction(0, 2, 20)],
        };
        let gateway = Arc::new(RecordingGateway::new());
        let coordinator = Arc::new(CrossShardCoordinator::new());
        let layout = layout();

        let mut dispatch = DispatchLoop::new(
            one_tick_config(),
            &layout,
            ledger(),
            synthesizer,
            gateway.clone(),
            coordinator.clone(),
        )
        .unwrap();
        let report = dispatch.run().await;

        assert_eq!(dispatch.state(), LoopState::Terminated);
        assert_eq!(report.ticks, 1);

        for leader in layout.leader_peers() {
            let sends = gateway.sends_to(&leader);
            assert_eq!(sends.len(), 1, "one batch per leader");
            assert_eq!(sends[0].transaction_count(), 1);
        }

        let broadcasts = gateway.broadcasts();
        assert_eq!(broadcasts.len(), 2);

        // Combined cross-shard batch: both leaders' cross transactions.
        let (cross_peers, cross_message) = &broadcasts[0];
        assert_eq!(cross_peers, &layout.leader_peers());
        assert_eq!(cross_message.transaction_count(), 2);

        // Then exactly one stop, to validators and leaders.
        let (stop_peers, stop_message) = &broadcasts[1];
        assert!(stop_message.is_control());
        assert_eq!(stop_peers, &layout.stop_targets());
        assert_eq!(stop_peers.len(), 4);
        assert_eq!(gateway.len(), 4);

        // Identical cross transaction from both leaders collapses to one id.
        assert_eq!(coordinator.pending_count(), 1);
        assert_eq!(report.pending_cross_shard, 1);
        assert_eq!(report.stop_peers, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_broadcast_without_cross_shard() {
        let synthesizer = FixedSynthesizer {
            intra: vec![],
            cross: vec![],
        };
        let gateway = Arc::new(RecordingGateway::new());
        let mut dispatch = DispatchLoop::new(
            one_tick_config(),
            &layout(),
            ledger(),
            synthesizer,
            gateway.clone(),
            Arc::new(CrossShardCoordinator::new()),
        )
        .unwrap();
        dispatch.run().await;

        // Empty batches are still sent to each leader.
        assert_eq!(gateway.len(), 3);
        let broadcasts = gateway.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        assert!(broadcasts[0].1.is_control());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_count_follows_duration() {
        let gateway = Arc::new(RecordingGateway::new());
        let config = one_tick_config()
            .with_run_duration(Duration::from_secs(5))
            .with_warmup(Duration::from_secs(10));
        let mut dispatch = DispatchLoop::new(
            config,
            &layout(),
            ledger(),
            FixedSynthesizer {
                intra: vec![],
                cross: vec![],
            },
            gateway.clone(),
            Arc::new(CrossShardCoordinator::new()),
        )
        .unwrap();

        let begun = Instant::now();
        let report = dispatch.run().await;

        assert_eq!(report.ticks, 10);
        assert_eq!(begun.elapsed(), Duration::from_secs(15));
        assert_eq!(gateway.broadcasts().len(), 1);
    }

    #[traced_test]
    #[tokio::test(start_paused = true)]
    async fn test_real_workload_tick() {
        let gateway = Arc::new(RecordingGateway::new());
        let coordinator = Arc::new(CrossShardCoordinator::new());
        let mut dispatch = DispatchLoop::new(
            one_tick_config(),
            &layout(),
            ledger(),
            UtxoSpendWorkload::new(10_000),
            gateway.clone(),
            coordinator.clone(),
        )
        .unwrap()
        .with_rng(StepRng::new(0, 0));

        let summary = dispatch.run_tick();

        // Always-cross source: shard 0 pairs with shard 1, shard 1 with shard 0.
        assert_eq!(summary, TickSummary { intra_shard: 0, cross_shard: 2, broadcast: true });
        assert_eq!(coordinator.pending_count(), 2);
        assert_eq!(dispatch.stats().total_sent(), 2);
        assert!(logs_contain("Broadcasting cross-shard transactions"));
    }

    #[test]
    fn test_rejects_mismatched_ledger() {
        let ledger = SharedLedger::new(LedgerMirror::new([ShardGroupId(0)]));
        let result = DispatchLoop::new(
            SpammerConfig::new(2),
            &layout(),
            ledger,
            UtxoSpendWorkload::new(10),
            RecordingGateway::new(),
            Arc::new(CrossShardCoordinator::new()),
        );
        assert!(matches!(
            result,
            Err(SpammerError::ShardMismatch { leaders: 2, views: 1 })
        ));
    }

    #[test]
    fn test_rejects_gapped_shard_ids() {
        let layout = NetworkLayout::new(
            vec![
                LeaderNode {
                    peer: Peer::new("10.0.0.1", 9000),
                    shard: ShardGroupId(1),
                },
                LeaderNode {
                    peer: Peer::new("10.0.0.2", 9000),
                    shard: ShardGroupId(2),
                },
            ],
            vec![],
            None,
        );
        let ledger = SharedLedger::new(LedgerMirror::new(layout.shard_ids()));
        let result = DispatchLoop::new(
            SpammerConfig::new(2),
            &layout,
            ledger,
            UtxoSpendWorkload::new(10),
            RecordingGateway::new(),
            Arc::new(CrossShardCoordinator::new()),
        );
        assert!(matches!(result, Err(SpammerError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn test_rejects_empty_topology() {
        let result = DispatchLoop::new(
            SpammerConfig::new(0),
            &NetworkLayout::default(),
            SharedLedger::default(),
            UtxoSpendWorkload::new(10),
            RecordingGateway::new(),
            Arc::new(CrossShardCoordinator::new()),
        );
        assert!(matches!(result, Err(SpammerError::Config(ConfigError::NoLeaders))));
    }
}
