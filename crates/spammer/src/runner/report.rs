//! Run statistics and the end-of-run report.

use hdrhistogram::Histogram;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters updated by the dispatch loop.
#[derive(Debug, Default)]
pub struct SpammerStats {
    /// Completed ticks.
    pub ticks: AtomicU64,
    /// Intra-shard transactions sent to leaders.
    pub intra_shard_sent: AtomicU64,
    /// Cross-shard transactions broadcast to leaders.
    pub cross_shard_sent: AtomicU64,
    /// Cross-shard broadcast calls.
    pub broadcasts: AtomicU64,
}

impl SpammerStats {
    /// Total transactions dispatched.
    pub fn total_sent(&self) -> u64 {
        self.intra_shard_sent.load(Ordering::Relaxed) + self.cross_shard_sent.load(Ordering::Relaxed)
    }

    /// Transactions per second over `elapsed`.
    pub fn tps(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_sent() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Wall time spent synthesizing, per leader call, in microseconds.
pub struct GenerationTimer {
    histogram: Histogram<u64>,
}

impl GenerationTimer {
    /// Create an empty auto-resizing histogram (3 significant digits).
    pub fn new() -> Result<Self, hdrhistogram::CreationError> {
        Ok(Self {
            histogram: Histogram::new(3)?,
        })
    }

    /// Record one synthesis call. Values past the trackable range are clamped.
    pub fn record(&mut self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(micros);
    }

    /// Number of recorded calls.
    pub fn count(&self) -> u64 {
        self.histogram.len()
    }

    fn quantile(&self, q: f64) -> Duration {
        Duration::from_micros(self.histogram.value_at_quantile(q))
    }

    /// Summary of the recorded distribution.
    pub fn summary(&self) -> GenerationSummary {
        GenerationSummary {
            calls: self.count(),
            p50_us: self.quantile(0.50).as_micros() as u64,
            p90_us: self.quantile(0.90).as_micros() as u64,
            p99_us: self.quantile(0.99).as_micros() as u64,
            max_us: self.histogram.max(),
        }
    }
}

/// Synthesis timing percentiles, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub calls: u64,
    pub p50_us: u64,
    pub p90_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Report generated after a run.
#[derive(Debug, Clone, Serialize)]
pub struct SpammerReport {
    /// Time from the first tick to termination, in seconds.
    pub duration_secs: f64,
    /// Ticks executed.
    pub ticks: u64,
    /// Intra-shard transactions sent.
    pub intra_shard_sent: u64,
    /// Cross-shard transactions broadcast.
    pub cross_shard_sent: u64,
    /// Cross-shard broadcast calls.
    pub cross_shard_broadcasts: u64,
    /// Cross-shard transactions still unconfirmed at the end.
    pub pending_cross_shard: usize,
    /// Peers that were sent the stop message.
    pub stop_peers: usize,
    /// Synthesis timing.
    pub generation: GenerationSummary,
    /// Average transactions dispatched per second.
    pub avg_tps: f64,
}

impl SpammerReport {
    /// Print the report to stdout.
    pub fn print(&self) {
        println!("\n=== Generator Report ===");
        println!("Duration: {:.1}s", self.duration_secs);
        println!("Ticks: {}", self.ticks);
        println!("Intra-shard sent: {}", self.intra_shard_sent);
        println!(
            "Cross-shard sent: {} ({} broadcasts)",
            self.cross_shard_sent, self.cross_shard_broadcasts
        );
        println!("Pending cross-shard: {}", self.pending_cross_shard);
        println!("Stop sent to: {} peers", self.stop_peers);
        println!(
            "Generation (per leader): p50 {}us | p90 {}us | p99 {}us | max {}us",
            self.generation.p50_us,
            self.generation.p90_us,
            self.generation.p99_us,
            self.generation.max_us
        );
        println!("Avg TPS: {:.2}", self.avg_tps);
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_summary() {
        let mut timer = GenerationTimer::new().unwrap();
        for micros in 1..=100u64 {
            timer.record(Duration::from_micros(micros));
        }
        let summary = timer.summary();
        assert_eq!(summary.calls, 100);
        assert_eq!(summary.p50_us, 50);
        assert_eq!(summary.max_us, 100);
    }

    #[test]
    fn test_oversized_sample_still_counted() {
        let mut timer = GenerationTimer::new().unwrap();
        timer.record(Duration::from_micros(10));
        timer.record(Duration::MAX);
        assert_eq!(timer.count(), 2);
        assert!(timer.summary().max_us >= 10);
    }

    #[test]
    fn test_report_json() {
        let report = SpammerReport {
            duration_secs: 1.5,
            ticks: 3,
            intra_shard_sent: 10,
            cross_shard_sent: 2,
            cross_shard_broadcasts: 1,
            pending_cross_shard: 2,
            stop_peers: 4,
            generation: GenerationSummary::default(),
            avg_tps: 8.0,
        };
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["ticks"], 3);
        assert_eq!(value["cross_shard_broadcasts"], 1);
        assert_eq!(value["generation"]["calls"], 0);
    }

    #[test]
    fn test_tps() {
        let stats = SpammerStats::default();
        stats.intra_shard_sent.store(30, Ordering::Relaxed);
        stats.cross_shard_sent.store(10, Ordering::Relaxed);
        assert_eq!(stats.tps(Duration::from_secs(4)), 10.0);
        assert_eq!(stats.tps(Duration::ZERO), 0.0);
    }
}
