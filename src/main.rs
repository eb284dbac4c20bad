//! Transaction relay daemon.
//!
//! Loads configuration, binds the WebSocket listener, and serves relay
//! sessions until shutdown.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use tx_relay::config::loader::load_config;
use tx_relay::identity::KeyStore;
use tx_relay::ledger::LedgerClient;
use tx_relay::observability::{logging, metrics};
use tx_relay::relay::LedgerBinder;
use tx_relay::{RelayConfig, RelayServer, Shutdown};

#[derive(Parser)]
#[command(name = "tx-relay")]
#[command(about = "WebSocket transaction relay", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    logging::init(&config.observability.log_filter);
    tracing::info!("tx-relay v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.chain.rpc_url,
        chain_id = config.chain.chain_id,
        max_attempts = config.retries.max_attempts,
        "Configuration loaded"
    );

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

    let client = LedgerClient::new(config.chain.clone()).await?;

    let store = match &config.identity.keystore_path {
        Some(path) => KeyStore::from_file(Path::new(path), config.chain.chain_id)?,
        None => KeyStore::from_env(config.chain.chain_id)?,
    };
    let binder = LedgerBinder::new(Arc::new(store), client);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = RelayServer::new(config, binder);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
