//! Shared scripted doubles for relay unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::RetryConfig;
use crate::identity::IdentityError;
use crate::ledger::{LedgerError, LedgerResult};
use crate::protocol::TransactionRequest;
use crate::relay::queue::TxSubmitter;
use crate::relay::signer::{BindError, SignerBinder};

/// Retry settings fast enough for tests.
pub(crate) fn test_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay_ms: 5,
        max_delay_ms: 20,
    }
}

/// Submitter double that fails a scripted number of leading calls and
/// records call interleaving.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedSubmitter {
    /// Number of leading calls that fail before calls start succeeding.
    fail_first: u32,
    /// Per-call delay in milliseconds, indexed by call number.
    delays_ms: Arc<Vec<u64>>,
    /// Total calls observed.
    pub calls: Arc<AtomicU32>,
    /// Calls currently executing.
    pub in_flight: Arc<AtomicU32>,
    /// High-water mark of concurrently executing calls.
    pub max_in_flight: Arc<AtomicU32>,
    /// Request id per call, in execution order.
    pub log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSubmitter {
    pub(crate) fn new(fail_first: u32) -> Self {
        Self {
            fail_first,
            delays_ms: Arc::new(Vec::new()),
            calls: Arc::new(AtomicU32::new(0)),
            in_flight: Arc::new(AtomicU32::new(0)),
            max_in_flight: Arc::new(AtomicU32::new(0)),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_delays(mut self, delays_ms: Vec<u64>) -> Self {
        self.delays_ms = Arc::new(delays_ms);
        self
    }
}

#[async_trait]
impl TxSubmitter for ScriptedSubmitter {
    type Receipt = serde_json::Value;

    async fn submit(&self, request: &TransactionRequest) -> LedgerResult<Self::Receipt> {
        let call_index = self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.log.lock().unwrap().push(request.id.to_string());

        let delay = self.delays_ms.get(call_index as usize).copied().unwrap_or(1);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if call_index < self.fail_first {
            Err(LedgerError::Rpc("insufficient funds".into()))
        } else {
            Ok(serde_json::json!({
                "transactionHash": format!("0x{:064x}", call_index),
                "status": "0x1",
            }))
        }
    }
}

/// Binder double: yields the scripted submitter, or an unknown-identity
/// error when none is configured.
#[derive(Debug)]
pub(crate) struct MockBinder {
    submitter: Option<ScriptedSubmitter>,
}

impl MockBinder {
    pub(crate) fn bound_to(submitter: ScriptedSubmitter) -> Self {
        Self {
            submitter: Some(submitter),
        }
    }

    pub(crate) fn unknown_identity() -> Self {
        Self { submitter: None }
    }
}

#[async_trait]
impl SignerBinder for MockBinder {
    type Submitter = ScriptedSubmitter;

    async fn bind(&self, session_id: &str) -> Result<Self::Submitter, BindError> {
        match &self.submitter {
            Some(submitter) => Ok(submitter.clone()),
            None => Err(BindError::Identity(IdentityError::Unknown(
                session_id.to_string(),
            ))),
        }
    }
}
