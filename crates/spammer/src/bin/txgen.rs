//! Transaction generator CLI.
//!
//! Floods the leaders of a sharded test network with synthetic UTXO spends
//! for a fixed duration, then tells every node to stop.

use clap::{Args, Parser, Subcommand};
use shardload_ledger::{LedgerMirror, SharedLedger};
use shardload_network::{NetworkGateway, RecordingGateway, TcpGateway, TcpGatewayConfig};
use shardload_spammer::config::{SettingsFile, SpammerConfig};
use shardload_spammer::genesis::{generate_genesis_toml, generate_genesis_toml_for_shard};
use shardload_spammer::runner::{DispatchLoop, SpammerReport};
use shardload_spammer::{BlockClient, CrossShardCoordinator, NetworkLayout, UtxoSpendWorkload};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "txgen")]
#[command(about = "Synthetic transaction generator for a sharded UTXO network")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the genesis every node derives, for cross-checking deployments
    Genesis {
        /// Number of shards
        #[arg(long, default_value = "2")]
        num_shards: u64,

        /// Synthetic addresses funded per shard
        #[arg(long, default_value = "10000")]
        num_addresses: u64,

        /// Balance per address
        #[arg(long, default_value = "1000")]
        balance: u64,

        /// Only print this shard's entry (for per-validator configs)
        #[arg(long)]
        shard: Option<u64>,
    },

    /// Generate load against the leaders listed in the topology file
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Topology file: one `ip port role [shard]` line per node
    #[arg(short, long, default_value = "local_config.txt")]
    config_file: PathBuf,

    /// Optional TOML settings overriding the defaults
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Maximum transactions per leader per tick
    #[arg(long)]
    max_txs_per_batch: Option<usize>,

    /// Duration to run (e.g., "30s", "5m")
    #[arg(short, long)]
    duration: Option<humantime::Duration>,

    /// Delay between ticks
    #[arg(long)]
    tick_interval: Option<humantime::Duration>,

    /// Wait before the first tick
    #[arg(long)]
    warmup: Option<humantime::Duration>,

    /// Disable cross-shard transactions
    #[arg(long)]
    no_cross_shard: bool,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the log file
    #[arg(long, default_value = "latest")]
    log_folder: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the final report as JSON to this path
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Record outbound messages in memory instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Genesis {
            num_shards,
            num_addresses,
            balance,
            shard,
        } => {
            // Output goes to stdout; no tracing.
            let toml = match shard {
                Some(shard) if shard >= num_shards => {
                    return Err(format!("shard {shard} out of range for {num_shards} shards").into())
                }
                Some(shard) => generate_genesis_toml_for_shard(num_addresses, balance, shard)?,
                None => generate_genesis_toml(num_shards, num_addresses, balance)?,
            };
            print!("{toml}");
        }
        Commands::Run(args) => run(args).await?,
    }

    Ok(())
}

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&args.log_folder)?;
    let file_appender = tracing_appender::rolling::never(&args.log_folder, "txgen.log");
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    let layout = NetworkLayout::load(&args.config_file)?;
    let config = build_config(&args, &layout)?;
    info!(
        leaders = layout.num_shards(),
        validators = layout.validators().len(),
        client_port = ?layout.client_port(),
        "Topology loaded"
    );

    let ledger = SharedLedger::new(LedgerMirror::with_genesis(
        layout.shard_ids(),
        config.num_addresses,
        config.initial_balance,
    ));
    let coordinator = Arc::new(CrossShardCoordinator::new());
    let workload = UtxoSpendWorkload::new(config.num_addresses)
        .with_sample_percent(config.sample_percent)
        .with_cross_shard_percent(config.cross_shard_percent);

    let cancel = CancellationToken::new();
    let listener = match layout.client_port() {
        Some(port) => {
            let client = BlockClient::new(ledger.clone(), coordinator.clone());
            Some(client.listen(port, cancel.clone()).await?)
        }
        None => {
            warn!("No client port configured; the ledger mirror will not advance past genesis");
            None
        }
    };

    let drain_timeout = config.drain_timeout;
    let report = if args.dry_run {
        let gateway = Arc::new(RecordingGateway::new());
        let report = generate(config, &layout, ledger, workload, gateway.clone(), coordinator).await?;
        info!(messages = gateway.len(), "Dry run recorded outbound messages");
        report
    } else {
        let gateway = Arc::new(TcpGateway::new(TcpGatewayConfig::default())?);
        let report = generate(config, &layout, ledger, workload, gateway.clone(), coordinator).await?;
        if !gateway.drain(drain_timeout).await {
            warn!(in_flight = gateway.in_flight(), "Sends still in flight after drain timeout");
        }
        let stats = gateway.stats();
        info!(
            delivered = stats.delivered,
            failed = stats.failed,
            bytes_sent = stats.bytes_sent,
            "Gateway finished"
        );
        report
    };

    report.print();
    if let Some(path) = &args.report_json {
        std::fs::write(path, report.to_json()?)?;
        info!(path = %path.display(), "Report written");
    }

    cancel.cancel();
    if let Some(handle) = listener {
        handle.await?;
    }
    Ok(())
}

fn build_config(
    args: &RunArgs,
    layout: &NetworkLayout,
) -> Result<SpammerConfig, Box<dyn std::error::Error>> {
    let mut config = SpammerConfig::for_layout(layout);
    if let Some(path) = &args.settings {
        config = config.apply_settings(&SettingsFile::load(path)?);
    }
    if let Some(max) = args.max_txs_per_batch {
        config = config.with_max_txs_per_tick(max);
    }
    if let Some(duration) = args.duration {
        config = config.with_run_duration(*duration);
    }
    if let Some(interval) = args.tick_interval {
        config = config.with_tick_interval(*interval);
    }
    if let Some(warmup) = args.warmup {
        config = config.with_warmup(*warmup);
    }
    if args.no_cross_shard {
        config = config.with_cross_shard(false);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

async fn generate<G: NetworkGateway>(
    config: SpammerConfig,
    layout: &NetworkLayout,
    ledger: SharedLedger,
    workload: UtxoSpendWorkload,
    gateway: G,
    coordinator: Arc<CrossShardCoordinator>,
) -> Result<SpammerReport, Box<dyn std::error::Error>> {
    let mut dispatch = DispatchLoop::new(config, layout, ledger, workload, gateway, coordinator)?;
    Ok(dispatch.run().await)
}
