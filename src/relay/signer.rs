//! Signer binding: session identifier → credential-bound submitter.
//!
//! # Responsibilities
//! - Resolve the session's credential exactly once, before any request
//! - Construct the only object through which the credential is used
//! - Run the build → sign → broadcast pipeline for one attempt
//!
//! # Security
//! - A failed lookup is fatal for the session; there is no transaction to
//!   attribute a key to
//! - The bound credential never crosses back over the transport boundary

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionReceipt;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::identity::{IdentityError, IdentityStore};
use crate::ledger::{Credential, LedgerClient, LedgerError, LedgerResult};
use crate::observability::metrics;
use crate::protocol::TransactionRequest;
use crate::relay::queue::TxSubmitter;

/// Why a session could not be bound to a signer.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("identity lookup failed: {0}")]
    Identity(#[from] IdentityError),
}

/// Resolves a session identifier into a credential-bound submitter.
#[async_trait]
pub trait SignerBinder: Send + Sync + 'static {
    type Submitter: TxSubmitter;

    /// Bind the session to its signing credential. Called exactly once per
    /// session, before any request is processed.
    async fn bind(&self, session_id: &str) -> Result<Self::Submitter, BindError>;
}

/// Production binder: identity store lookup plus a shared ledger client.
#[derive(Debug)]
pub struct LedgerBinder<S> {
    store: Arc<S>,
    client: LedgerClient,
}

impl<S: IdentityStore> LedgerBinder<S> {
    pub fn new(store: Arc<S>, client: LedgerClient) -> Self {
        Self { store, client }
    }

    /// The underlying ledger client, shared with health reporting.
    pub fn client(&self) -> &LedgerClient {
        &self.client
    }
}

#[async_trait]
impl<S: IdentityStore> SignerBinder for LedgerBinder<S> {
    type Submitter = BoundSigner;

    async fn bind(&self, session_id: &str) -> Result<BoundSigner, BindError> {
        let credential = self.store.lookup(session_id).await?;
        tracing::info!(
            session = %session_id,
            address = %credential.address(),
            "Signer bound"
        );
        Ok(BoundSigner::new(self.client.clone(), credential))
    }
}

/// A ledger-submission client scoped to one session's credential.
///
/// This is the only path by which the credential is used.
#[derive(Debug)]
pub struct BoundSigner {
    client: LedgerClient,
    credential: Credential,
}

impl BoundSigner {
    pub fn new(client: LedgerClient, credential: Credential) -> Self {
        Self { client, credential }
    }

    /// The bound account address.
    pub fn address(&self) -> Address {
        self.credential.address()
    }

    /// Build a populated transaction skeleton for the request.
    ///
    /// Syncs the nonce from the chain, prices gas under the configured
    /// ceiling, and estimates the gas limit. Failures here are retryable.
    async fn prepare(
        &self,
        to: Address,
        value: U256,
        input: Bytes,
    ) -> LedgerResult<alloy::rpc::types::TransactionRequest> {
        // Sync nonce from chain; a failed prior attempt may have left the
        // local counter stale.
        let chain_nonce = self
            .client
            .get_transaction_count(self.credential.address())
            .await?;
        self.credential.set_nonce(chain_nonce);

        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;

        let config = self.client.config();
        if gas_price_gwei > config.max_gas_price_gwei as u128 {
            return Err(LedgerError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: config.max_gas_price_gwei,
            });
        }

        // Safety margin over the quoted price
        let adjusted_gas_price = (gas_price as f64 * config.gas_price_multiplier) as u128;

        let nonce = self.credential.get_and_increment_nonce();

        let tx = alloy::rpc::types::TransactionRequest::default()
            .with_from(self.credential.address())
            .with_to(to)
            .with_value(value)
            .with_input(input)
            .with_nonce(nonce)
            .with_gas_price(adjusted_gas_price)
            .with_chain_id(self.credential.chain_id());

        let gas_limit = self.client.estimate_gas(&tx).await?;
        Ok(tx.with_gas_limit(gas_limit))
    }
}

#[async_trait]
impl TxSubmitter for BoundSigner {
    type Receipt = TransactionReceipt;

    async fn submit(&self, request: &TransactionRequest) -> LedgerResult<TransactionReceipt> {
        let (to, value, input) = decode_request(request)?;

        let skeleton = self.prepare(to, value, input).await?;
        let raw = self.credential.sign_transaction(skeleton).await?;
        let tx_hash = self.client.send_raw_transaction(&raw).await?;

        tracing::debug!(
            request_id = request.id,
            tx_hash = %tx_hash,
            "Transaction broadcast, awaiting inclusion"
        );
        metrics::record_broadcast();

        self.client.wait_for_receipt(tx_hash).await
    }
}

/// Decode the wire-level string fields into ledger types.
fn decode_request(request: &TransactionRequest) -> LedgerResult<(Address, U256, Bytes)> {
    let to: Address = request
        .to
        .parse()
        .map_err(|e| LedgerError::InvalidRequest(format!("bad 'to' address '{}': {}", request.to, e)))?;

    let digits = request.value.strip_prefix("0x").ok_or_else(|| {
        LedgerError::InvalidRequest(format!("value '{}' is not 0x-prefixed hex", request.value))
    })?;
    let value = U256::from_str_radix(digits, 16).map_err(|e| {
        LedgerError::InvalidRequest(format!("bad value '{}': {}", request.value, e))
    })?;

    let input: Bytes = request
        .input
        .parse()
        .map_err(|e| LedgerError::InvalidRequest(format!("bad input '{}': {}", request.input, e)))?;

    Ok((to, value, input))
}
