//! Signing credential and nonce tracking.
//!
//! # Security
//! - Keys are never logged or serialized
//! - Each credential is owned by exactly one session for its lifetime

use alloy::consensus::Transaction;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ledger::types::{LedgerError, LedgerResult};

/// A user's signing credential with nonce tracking.
#[derive(Debug)]
pub struct Credential {
    /// Network wallet wrapping the signing key.
    wallet: EthereumWallet,
    /// Address derived from the key.
    address: Address,
    /// Current nonce for sequential transactions.
    nonce: Arc<AtomicU64>,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
}

impl Credential {
    /// Create a credential from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for transaction signing
    ///
    /// # Security
    /// The key is parsed and held in memory only. It is never logged.
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> LedgerResult<Self> {
        // Strip 0x prefix if present
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| LedgerError::Signer(format!("Invalid private key format: {}", e)))?;
        let address = signer.address();

        Ok(Self {
            wallet: EthereumWallet::from(signer),
            address,
            nonce: Arc::new(AtomicU64::new(0)),
            chain_id,
        })
    }

    /// Get the credential's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the chain ID this credential is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Get and increment the nonce atomically.
    ///
    /// This ensures sequential transactions don't collide.
    pub fn get_and_increment_nonce(&self) -> u64 {
        self.nonce.fetch_add(1, Ordering::SeqCst)
    }

    /// Set the nonce to a specific value (e.g., after querying from chain).
    pub fn set_nonce(&self, nonce: u64) {
        self.nonce.store(nonce, Ordering::SeqCst);
    }

    /// Get current nonce without incrementing.
    pub fn current_nonce(&self) -> u64 {
        self.nonce.load(Ordering::SeqCst)
    }

    /// Sign a fully populated transaction request into a raw RLP payload
    /// ready for broadcast.
    ///
    /// The request must already carry nonce, gas, and chain id; incomplete
    /// requests fail here rather than on the wire.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> LedgerResult<Vec<u8>> {
        let envelope = tx
            .build(&self.wallet)
            .await
            .map_err(|e| LedgerError::Signer(format!("Signing failed: {}", e)))?;
        debug_assert_eq!(envelope.chain_id(), Some(self.chain_id));
        Ok(envelope.encoded_2718())
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self {
            wallet: self.wallet.clone(),
            address: self.address,
            nonce: self.nonce.clone(),
            chain_id: self.chain_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::network::TransactionBuilder;
    use alloy::primitives::U256;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn credential_from_private_key() {
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();
        // This is the corresponding address for the test key
        assert_eq!(
            credential.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn credential_with_0x_prefix() {
        let credential =
            Credential::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY), 1).unwrap();
        assert_eq!(
            credential.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn nonce_management() {
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();

        assert_eq!(credential.current_nonce(), 0);
        assert_eq!(credential.get_and_increment_nonce(), 0);
        assert_eq!(credential.get_and_increment_nonce(), 1);
        assert_eq!(credential.current_nonce(), 2);

        credential.set_nonce(100);
        assert_eq!(credential.current_nonce(), 100);
    }

    #[test]
    fn invalid_private_key() {
        let result = Credential::from_private_key("invalid_key", 1);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[tokio::test]
    async fn signs_complete_transaction_request() {
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();
        let to: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();

        let tx = TransactionRequest::default()
            .with_from(credential.address())
            .with_to(to)
            .with_value(U256::from(1u64))
            .with_nonce(0)
            .with_gas_price(1_000_000_000)
            .with_gas_limit(21_000)
            .with_chain_id(1);

        let raw = credential.sign_transaction(tx).await.unwrap();
        assert!(!raw.is_empty());
    }

    #[tokio::test]
    async fn incomplete_request_fails_to_sign() {
        let credential = Credential::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();
        // No nonce, gas, or chain id
        let tx = TransactionRequest::default();
        let result = credential.sign_transaction(tx).await;
        assert!(result.is_err());
    }
}
