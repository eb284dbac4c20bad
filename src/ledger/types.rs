//! Ledger-specific types and error definitions.

use thiserror::Error;

// Re-export ChainConfig from the config module to avoid duplication
pub use crate::config::schema::ChainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The request carried fields the ledger cannot interpret.
    #[error("invalid transaction request: {0}")]
    InvalidRequest(String),

    /// Transaction was not confirmed within the configured window.
    #[error("transaction not confirmed within {0} seconds")]
    ConfirmationTimeout(u64),

    /// Transaction was included but reverted on-chain.
    #[error("transaction reverted: {reason}")]
    Reverted {
        reason: String,
        /// Structured revert payload when the node supplied one. Logged,
        /// never forwarded verbatim to the client.
        data: Option<String>,
    },

    /// Signing failed or the key material is unusable.
    #[error("signer error: {0}")]
    Signer(String),

    /// Gas price exceeded the configured ceiling.
    #[error("gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
