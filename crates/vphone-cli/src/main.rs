//! vphoned — the on-device agent binary.

use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use vphone_agent::{Agent, Config, MemoryStore, SubscriptionLedger};
use vphone_host::HostCapabilities;

#[derive(Parser)]
#[command(
    name = "vphoned",
    about = "On-device agent for virtual phone instances",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the agent.
    Start {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<String>,

        /// Host backend to run against.
        #[arg(long, default_value = "mock")]
        backend: String,
    },

    /// Print the effective configuration as TOML.
    ShowConfig {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn select_backend(backend: &str) -> anyhow::Result<HostCapabilities> {
    match backend {
        "mock" => Ok(vphone_host::mock::MockHost::new().capabilities()),
        other => bail!("unknown host backend '{other}' (available: mock)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config, backend } => {
            let config = vphone_agent::config::load_config(config.as_deref())?;
            init_logging(&config);

            let host = select_backend(&backend)?;
            let ledger = Arc::new(SubscriptionLedger::new(Box::new(MemoryStore::default())));

            // Host adapters would hold the sender end; the mock backend
            // has none, so the channel simply stays idle.
            let (_event_tx, event_rx) = mpsc::channel(16);

            let agent = Agent::new(config, host, ledger, event_rx);
            let shutdown = agent.shutdown_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received");
                    shutdown.notify_one();
                }
            });

            tracing::info!(backend = %backend, "starting vphone agent");
            agent.run().await?;
        }
        Commands::ShowConfig { config } => {
            let config = vphone_agent::config::load_config(config.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.agent.log_level)),
        )
        .init();
}
