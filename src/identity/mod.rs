//! Identity store: session identifier → signing credential.
//!
//! # Responsibilities
//! - Resolve a session's address to the signing key held for that user
//! - Report "not found" distinctly so sessions can fail fast at connect
//!
//! # Security
//! - Key material is read once at startup and never logged
//! - Lookups hand out an owned [`Credential`]; the store itself never
//!   crosses the transport boundary

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::ledger::Credential;

/// Environment variable holding a signing key for single-user deployments.
pub const SIGNING_KEY_ENV_VAR: &str = "RELAY_SIGNING_KEY";

/// Errors produced by identity resolution.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No credential is registered for the address. Fatal for the session.
    #[error("no credential registered for address {0}")]
    Unknown(String),

    /// A credential exists but its key material is unusable.
    #[error("invalid credential for address {address}: {reason}")]
    Invalid { address: String, reason: String },

    /// The backing store could not be read.
    #[error("keystore error: {0}")]
    Store(String),
}

/// Resolves session identifiers to signing credentials.
///
/// Implementations may be backed by files, databases, or remote services;
/// the relay core only depends on this boundary.
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    /// Look up the signing credential for a session identifier.
    async fn lookup(&self, session_id: &str) -> Result<Credential, IdentityError>;
}

/// On-disk keystore file shape.
#[derive(Debug, Deserialize)]
struct KeyStoreFile {
    /// Address → hex-encoded signing key.
    keys: HashMap<String, String>,
}

/// File-backed identity store.
///
/// Keys are held as hex strings and parsed into a [`Credential`] per
/// lookup, so one bad entry poisons only its own sessions.
#[derive(Debug)]
pub struct KeyStore {
    /// Lowercased address → hex-encoded signing key.
    keys: HashMap<String, String>,
    /// Chain ID stamped onto issued credentials.
    chain_id: u64,
}

impl KeyStore {
    /// Create an empty store.
    pub fn new(chain_id: u64) -> Self {
        Self {
            keys: HashMap::new(),
            chain_id,
        }
    }

    /// Load a keystore from a TOML file:
    ///
    /// ```toml
    /// [keys]
    /// "0xf39f..." = "0xac09..."
    /// ```
    pub fn from_file(path: &Path, chain_id: u64) -> Result<Self, IdentityError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| IdentityError::Store(format!("failed to read {}: {}", path.display(), e)))?;
        let file: KeyStoreFile = toml::from_str(&content)
            .map_err(|e| IdentityError::Store(format!("failed to parse {}: {}", path.display(), e)))?;

        let mut store = Self::new(chain_id);
        for (address, key) in file.keys {
            store.insert(&address, &key);
        }

        tracing::info!(
            path = %path.display(),
            entries = store.len(),
            "Keystore loaded"
        );
        Ok(store)
    }

    /// Load a single-user store from the `RELAY_SIGNING_KEY` environment
    /// variable, registering the key under its own derived address.
    pub fn from_env(chain_id: u64) -> Result<Self, IdentityError> {
        let key = std::env::var(SIGNING_KEY_ENV_VAR).map_err(|_| {
            IdentityError::Store(format!(
                "environment variable {} not set",
                SIGNING_KEY_ENV_VAR
            ))
        })?;

        let credential = Credential::from_private_key(&key, chain_id).map_err(|e| {
            IdentityError::Store(format!("{} holds an unusable key: {}", SIGNING_KEY_ENV_VAR, e))
        })?;
        let address = credential.address().to_string();

        let mut store = Self::new(chain_id);
        store.insert(&address, &key);
        tracing::info!(address = %address, "Keystore loaded from environment");
        Ok(store)
    }

    /// Register a key for an address.
    pub fn insert(&mut self, address: &str, key_hex: &str) {
        self.keys.insert(address.to_lowercase(), key_hex.to_string());
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the store holds no identities.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl IdentityStore for KeyStore {
    async fn lookup(&self, session_id: &str) -> Result<Credential, IdentityError> {
        let key = self
            .keys
            .get(&session_id.to_lowercase())
            .ok_or_else(|| IdentityError::Unknown(session_id.to_string()))?;

        Credential::from_private_key(key, self.chain_id).map_err(|e| IdentityError::Invalid {
            address: session_id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let mut store = KeyStore::new(1);
        store.insert(TEST_ADDRESS, TEST_PRIVATE_KEY);

        let credential = store.lookup(&TEST_ADDRESS.to_uppercase().replace("0X", "0x")).await;
        assert!(credential.is_ok());
        let credential = store.lookup(&TEST_ADDRESS.to_lowercase()).await.unwrap();
        assert_eq!(credential.chain_id(), 1);
    }

    #[tokio::test]
    async fn unknown_address_is_distinct() {
        let store = KeyStore::new(1);
        let err = store.lookup("0xdeadbeef").await.unwrap_err();
        assert!(matches!(err, IdentityError::Unknown(_)));
    }

    #[tokio::test]
    async fn corrupt_key_reports_invalid() {
        let mut store = KeyStore::new(1);
        store.insert(TEST_ADDRESS, "zz-not-hex");
        let err = store.lookup(TEST_ADDRESS).await.unwrap_err();
        assert!(matches!(err, IdentityError::Invalid { .. }));
    }

    #[test]
    fn loads_keystore_file() {
        let dir = std::env::temp_dir().join("tx-relay-keystore-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("keys.toml");
        std::fs::write(
            &path,
            format!("[keys]\n\"{}\" = \"{}\"\n", TEST_ADDRESS, TEST_PRIVATE_KEY),
        )
        .unwrap();

        let store = KeyStore::from_file(&path, 1).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_keystore_file_is_store_error() {
        let err = KeyStore::from_file(Path::new("/nonexistent/keys.toml"), 1).unwrap_err();
        assert!(matches!(err, IdentityError::Store(_)));
    }
}
