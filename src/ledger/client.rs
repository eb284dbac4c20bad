//! Ledger RPC client with failover, timeouts, and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Populate transaction skeletons (nonce, gas price, gas limit)
//! - Broadcast signed payloads and await inclusion
//! - Provide a health check for ledger connectivity

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::ledger::types::{ChainConfig, ChainId, LedgerError, LedgerResult};
use crate::observability::metrics;

/// How often receipt polling re-queries the chain.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Ledger RPC client wrapper with failover support.
#[derive(Clone)]
pub struct LedgerClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configuration.
    config: ChainConfig,
    /// Per-call timeout duration.
    timeout_duration: Duration,
}

impl LedgerClient {
    /// Create a new ledger client.
    ///
    /// Initialization succeeds even when the endpoint is unreachable; chain
    /// verification failures are logged and surfaced on first use instead.
    pub async fn new(config: ChainConfig) -> LedgerResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            LedgerError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url))
            as Arc<dyn Provider + Send + Sync>);

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url))
                    as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Ledger client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Ledger client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> LedgerResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> LedgerResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(LedgerError::Rpc("all RPC providers failed during get_chain_id".to_string()))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> LedgerResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_block_number();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(LedgerError::Rpc("all RPC providers failed during get_block_number".to_string()))
    }

    /// Get the transaction count (nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> LedgerResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_count(address);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(LedgerError::Rpc("all RPC providers failed during get_transaction_count".to_string()))
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> LedgerResult<u128> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_gas_price();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(LedgerError::Rpc("all RPC providers failed during get_gas_price".to_string()))
    }

    /// Estimate the gas limit for a populated transaction request.
    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> LedgerResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.estimate_gas(tx.clone());
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(LedgerError::Rpc("all RPC providers failed during estimate_gas".to_string()))
    }

    /// Broadcast a signed raw transaction, returning its hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> LedgerResult<TxHash> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.send_raw_transaction(raw);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(pending)) => return Ok(*pending.tx_hash()),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(LedgerError::Rpc("all RPC providers failed during send_raw_transaction".to_string()))
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> LedgerResult<Option<TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_receipt(tx_hash);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(LedgerError::Rpc("all RPC providers failed during get_transaction_receipt".to_string()))
    }

    /// Wait for a broadcast transaction to be included and confirmed.
    ///
    /// Polls the chain until the receipt is present and buried under the
    /// configured confirmation depth, bounded by the confirmation timeout.
    /// A reverted transaction surfaces as [`LedgerError::Reverted`].
    pub async fn wait_for_receipt(&self, tx_hash: TxHash) -> LedgerResult<TransactionReceipt> {
        let required_confirmations = self.config.confirmation_blocks;
        let timeout_duration = Duration::from_secs(self.config.confirmation_timeout_secs);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(RECEIPT_POLL_INTERVAL);

            loop {
                ticker.tick().await;

                let receipt = match self.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Err(LedgerError::Reverted {
                        reason: "transaction reverted on-chain".to_string(),
                        data: None,
                    });
                }

                let current_block = self.get_block_number().await?;
                let tx_block = receipt.block_number.unwrap_or(current_block);
                let confirmations = current_block.saturating_sub(tx_block) as u32;

                if confirmations >= required_confirmations {
                    return Ok(receipt);
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(receipt) => receipt,
            Err(_) => Err(LedgerError::ConfirmationTimeout(
                self.config.confirmation_timeout_secs,
            )),
        }
    }

    /// Check if the ledger is reachable and healthy.
    ///
    /// Returns true if we can query the block number.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_ledger_health(healthy);
        healthy
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
