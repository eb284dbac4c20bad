//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use tx_relay::config::RelayConfig;
use tx_relay::identity::KeyStore;
use tx_relay::ledger::LedgerClient;
use tx_relay::relay::LedgerBinder;
use tx_relay::{RelayServer, Shutdown};

// Well-known test private key (Anvil's first account)
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Start a relay on an ephemeral port, wired to an unreachable ledger
/// endpoint with a fast retry schedule. Returns the bound address and the
/// shutdown handle keeping the server alive.
pub async fn start_relay() -> (SocketAddr, Shutdown) {
    let mut config = RelayConfig::default();
    config.chain.rpc_url = "http://127.0.0.1:1".to_string();
    config.chain.rpc_timeout_secs = 1;
    config.chain.confirmation_timeout_secs = 2;
    config.retries.max_attempts = 3;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 40;

    let client = LedgerClient::new(config.chain.clone()).await.unwrap();

    let mut store = KeyStore::new(config.chain.chain_id);
    store.insert(TEST_ADDRESS, TEST_PRIVATE_KEY);
    let binder = LedgerBinder::new(Arc::new(store), client);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = RelayServer::new(config, binder);
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
