//! Wallet session console.
//!
//! # Architecture Overview
//!
//! ```text
//!   stdin ──▶ Console ──▶ LifecycleManager ──▶ AuthCore ──▶ WalletAdapter ──▶ wallet / chain
//!                ▲               │   ▲             │
//!                │               │   └── events ───┘
//!   stdout ◀─ StatusView ◀─ LifecycleState
//!                                │
//!                                └──▶ EthGateway (one per session) ──▶ RpcClient
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use wallet_session::config::{load_config, SessionConfig};
use wallet_session::observability::{logging, metrics};
use wallet_session::presentation::Console;
use wallet_session::LifecycleManager;

#[derive(Parser)]
#[command(name = "wallet-session")]
#[command(about = "Connect a wallet and manage its session", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chain identifier; overrides the configured chain
    #[arg(long)]
    chain: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive wallet console (default)
    Console,
    /// List the known chains
    Chains,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(chain) = cli.chain {
        config.chain = chain;
    }

    logging::init_tracing(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "wallet-session starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let manager = LifecycleManager::from_config(&config)?;

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Chains => {
            for chain in manager.registry().iter() {
                println!(
                    "{:<10} {:<10} {:<20} {}",
                    chain.identifier, chain.chain_id, chain.display_name, chain.rpc_target
                );
            }
        }
        Commands::Console => {
            manager.initialize(&config.chain).await?;
            tracing::info!(
                chain = %config.chain,
                adapters = ?config.enabled_adapters(),
                "Wallet console ready"
            );

            let console = Console::new(manager.clone());
            let result = console
                .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await;

            manager.teardown().await;
            result?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
