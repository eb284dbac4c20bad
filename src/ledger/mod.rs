//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Identity store (signing key per user)
//!     → wallet.rs (key parsing, transaction signing, nonce tracking)
//!     → client.rs (RPC connection with failover and timeouts)
//!     → relay::signer (build, sign, broadcast, await inclusion)
//! ```
//!
//! # Security Constraints
//! - Signing keys are never logged or serialized
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when the ledger is unreachable at startup

pub mod client;
pub mod types;
pub mod wallet;

pub use client::LedgerClient;
pub use types::{ChainId, LedgerError, LedgerResult};
pub use wallet::Credential;
