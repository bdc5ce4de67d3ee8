//! Configuration types for the load generator.

use crate::topology::NetworkLayout;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default per-tick cap on generated transactions, per leader.
pub const DEFAULT_MAX_TXS_PER_TICK: usize = 100_000;
/// Default size of the synthetic address space.
pub const DEFAULT_NUM_ADDRESSES: u64 = 10_000;
/// Default genesis balance per synthetic address and shard.
pub const DEFAULT_INITIAL_BALANCE: u64 = 1_000;

/// Configuration for a generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpammerConfig {
    /// Maximum transactions synthesized per leader per tick.
    pub max_txs_per_tick: usize,

    /// Fixed delay between ticks.
    pub tick_interval: Duration,

    /// Wall-clock length of the run, measured after warm-up.
    pub run_duration: Duration,

    /// Delay before the first tick, giving nodes time to come up.
    pub warmup: Duration,

    /// How often progress is logged.
    pub progress_interval: Duration,

    /// Synthetic address space size N; outputs go to addresses in `[0, N)`.
    pub num_addresses: u64,

    /// Genesis balance of every synthetic address on every shard.
    pub initial_balance: u64,

    /// Whether cross-shard transactions are generated.
    pub cross_shard: bool,

    /// Percent of UTXOs selected for spending on each scan.
    pub sample_percent: u32,

    /// Percent of UTXOs (out of all scanned) turned into cross-shard spends.
    /// Must not exceed `sample_percent`.
    pub cross_shard_percent: u32,

    /// RNG seed for reproducible runs. Random when unset.
    pub seed: Option<u64>,

    /// How long to wait for in-flight sends after the stop broadcast.
    pub drain_timeout: Duration,
}

impl Default for SpammerConfig {
    fn default() -> Self {
        Self {
            max_txs_per_tick: DEFAULT_MAX_TXS_PER_TICK,
            tick_interval: Duration::from_millis(500),
            run_duration: Duration::from_secs(300),
            warmup: Duration::from_secs(10),
            progress_interval: Duration::from_secs(10),
            num_addresses: DEFAULT_NUM_ADDRESSES,
            initial_balance: DEFAULT_INITIAL_BALANCE,
            cross_shard: false,
            sample_percent: 30,
            cross_shard_percent: 10,
            seed: None,
            drain_timeout: Duration::from_secs(10),
        }
    }
}

impl SpammerConfig {
    /// Defaults for a network with `num_shards` shards. Cross-shard
    /// generation is on whenever there is more than one shard.
    pub fn new(num_shards: usize) -> Self {
        Self {
            cross_shard: num_shards > 1,
            ..Self::default()
        }
    }

    /// Defaults for the given topology.
    pub fn for_layout(layout: &NetworkLayout) -> Self {
        Self::new(layout.num_shards())
    }

    /// Set the per-tick transaction cap.
    pub fn with_max_txs_per_tick(mut self, max: usize) -> Self {
        self.max_txs_per_tick = max;
        self
    }

    /// Set the inter-tick delay.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the run duration.
    pub fn with_run_duration(mut self, duration: Duration) -> Self {
        self.run_duration = duration;
        self
    }

    /// Set the warm-up delay.
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the progress logging interval.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the synthetic address space size.
    pub fn with_num_addresses(mut self, num_addresses: u64) -> Self {
        self.num_addresses = num_addresses;
        self
    }

    /// Set the genesis balance.
    pub fn with_initial_balance(mut self, balance: u64) -> Self {
        self.initial_balance = balance;
        self
    }

    /// Enable or disable cross-shard generation.
    pub fn with_cross_shard(mut self, enabled: bool) -> Self {
        self.cross_shard = enabled;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid("tick_interval must be non-zero".into()));
        }
        if self.num_addresses == 0 {
            return Err(ConfigError::Invalid("num_addresses must be at least 1".into()));
        }
        if self.sample_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "sample_percent {} exceeds 100",
                self.sample_percent
            )));
        }
        if self.cross_shard_percent > self.sample_percent {
            return Err(ConfigError::Invalid(format!(
                "cross_shard_percent {} exceeds sample_percent {}",
                self.cross_shard_percent, self.sample_percent
            )));
        }
        Ok(())
    }

    /// Apply overrides from a settings file.
    pub fn apply_settings(mut self, settings: &SettingsFile) -> Self {
        if let Some(max) = settings.max_txs_per_tick {
            self.max_txs_per_tick = max;
        }
        if let Some(ms) = settings.tick_interval_ms {
            self.tick_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = settings.run_duration_secs {
            self.run_duration = Duration::from_secs(secs);
        }
        if let Some(secs) = settings.warmup_secs {
            self.warmup = Duration::from_secs(secs);
        }
        if let Some(secs) = settings.progress_interval_secs {
            self.progress_interval = Duration::from_secs(secs);
        }
        if let Some(n) = settings.num_addresses {
            self.num_addresses = n;
        }
        if let Some(balance) = settings.initial_balance {
            self.initial_balance = balance;
        }
        if let Some(enabled) = settings.cross_shard {
            self.cross_shard = enabled;
        }
        if let Some(percent) = settings.sample_percent {
            self.sample_percent = percent;
        }
        if let Some(percent) = settings.cross_shard_percent {
            self.cross_shard_percent = percent;
        }
        if settings.seed.is_some() {
            self.seed = settings.seed;
        }
        self
    }
}

/// Optional TOML settings file. Every field overrides the topology-derived
/// default when present.
///
/// ```toml
/// max_txs_per_tick = 50000
/// tick_interval_ms = 250
/// run_duration_secs = 120
/// cross_shard = true
/// seed = 7
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub max_txs_per_tick: Option<usize>,
    #[serde(default)]
    pub tick_interval_ms: Option<u64>,
    #[serde(default)]
    pub run_duration_secs: Option<u64>,
    #[serde(default)]
    pub warmup_secs: Option<u64>,
    #[serde(default)]
    pub progress_interval_secs: Option<u64>,
    #[serde(default)]
    pub num_addresses: Option<u64>,
    #[serde(default)]
    pub initial_balance: Option<u64>,
    #[serde(default)]
    pub cross_shard: Option<bool>,
    #[serde(default)]
    pub sample_percent: Option<u32>,
    #[serde(default)]
    pub cross_shard_percent: Option<u32>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SettingsFile {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Topology line {line}: {reason}")]
    Topology { line: usize, reason: String },

    #[error("Topology has no leaders")]
    NoLeaders,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn topology(line: usize, reason: impl Into<String>) -> Self {
        ConfigError::Topology {
            line,
            reason: reason.into(),
        }
    }
}
