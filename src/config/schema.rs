//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the transaction relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, session limits).
    pub listener: ListenerConfig,

    /// Ledger connection settings.
    pub chain: ChainConfig,

    /// Identity store settings.
    pub identity: IdentityConfig,

    /// Retry configuration for transaction submission.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrently open sessions (backpressure).
    pub max_sessions: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_sessions: 1_024,
        }
    }
}

/// Ledger connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Primary JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover RPC endpoints, tried in order when the primary fails.
    pub failover_urls: Vec<String>,

    /// Expected chain ID (EIP-155 replay protection).
    pub chain_id: u64,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Blocks a transaction must be buried under before it counts as final.
    pub confirmation_blocks: u32,

    /// Maximum time to wait for a broadcast transaction to be included.
    pub confirmation_timeout_secs: u64,

    /// Multiplier applied to the quoted gas price as a safety margin.
    pub gas_price_multiplier: f64,

    /// Refuse to submit when the quoted gas price exceeds this (gwei).
    pub max_gas_price_gwei: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 60,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
        }
    }
}

/// Identity store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Path to the TOML keystore file mapping addresses to signing keys.
    /// When absent, a single-user store is loaded from the environment.
    pub keystore_path: Option<String>,
}

/// Retry configuration for transaction submission.
///
/// The source system left its retry timing implicit; here both the attempt
/// budget and the backoff bounds are explicit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per task, including the first (1 = no retries).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is not set.
    pub log_filter: String,

    /// Enable the Prometheus metrics exporter.
    pub metrics_enabled: bool,

    /// Address the metrics endpoint binds to.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "tx_relay=debug,tower_http=debug".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_complete() {
        let config = RelayConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.retries.max_attempts, 3);
        assert_eq!(config.chain.rpc_timeout_secs, 10);
        assert!(config.identity.keystore_path.is_none());
    }

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [chain]
            rpc_url = "http://10.0.0.1:8545"
            chain_id = 11155931
            "#,
        )
        .unwrap();

        assert_eq!(config.chain.rpc_url, "http://10.0.0.1:8545");
        assert_eq!(config.chain.chain_id, 11155931);
        // Untouched sections keep their defaults
        assert_eq!(config.retries.max_attempts, 3);
        assert_eq!(config.listener.max_sessions, 1_024);
    }

    #[test]
    fn retry_section_round_trips() {
        let config: RelayConfig = toml::from_str(
            r#"
            [retries]
            max_attempts = 5
            base_delay_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.retries.max_attempts, 5);
        assert_eq!(config.retries.base_delay_ms, 50);
        assert_eq!(config.retries.max_delay_ms, 2_000);
    }
}
