//! Serialized execution queue.
//!
//! # Responsibilities
//! - Accept submission tasks and run them one at a time, in order
//! - Apply the retry budget to each task before admitting the next
//! - Report every task's final outcome exactly once
//!
//! # Design Decisions
//! - Strict FIFO with a single worker: the credential behind a session maps
//!   to one account nonce sequence, so concurrent submissions would race on
//!   nonce assignment
//! - A task's retries complete fully (success or final failure) before the
//!   next task starts, so completion order equals submission order
//! - Queue depth is unbounded; a stalled ledger call stalls the session,
//!   bounded only by the ledger client's own timeouts

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::RetryConfig;
use crate::ledger::LedgerResult;
use crate::observability::metrics;
use crate::protocol::TransactionRequest;
use crate::resilience::calculate_backoff;

/// Executes one transaction submission attempt end to end
/// (build → sign → broadcast → await receipt).
#[async_trait]
pub trait TxSubmitter: Send + Sync + 'static {
    /// Confirmation returned on successful inclusion. Opaque to the queue;
    /// serialized into the success response unmodified.
    type Receipt: Serialize + Send + 'static;

    /// Run one full submission attempt for the request.
    async fn submit(&self, request: &TransactionRequest) -> LedgerResult<Self::Receipt>;
}

/// One queued unit of work, produced 1:1 from a validated request.
#[derive(Debug, Clone)]
pub struct ExecutionTask {
    /// The originating request.
    pub request: TransactionRequest,
    /// Submission attempts consumed so far.
    pub attempts: u32,
}

impl ExecutionTask {
    fn new(request: TransactionRequest) -> Self {
        Self {
            request,
            attempts: 0,
        }
    }
}

/// A task's final outcome, emitted exactly once per admitted task.
#[derive(Debug)]
pub struct Completion<R> {
    pub task: ExecutionTask,
    pub outcome: LedgerResult<R>,
}

/// Handle to a session's single-worker execution queue.
///
/// Dropping the handle closes the queue; the worker drains already-admitted
/// tasks before exiting.
#[derive(Debug)]
pub struct ExecutionQueue {
    submit_tx: mpsc::UnboundedSender<ExecutionTask>,
}

impl ExecutionQueue {
    /// Spawn the worker for one session.
    ///
    /// Returns the submission handle and the stream of completions, which
    /// arrive strictly in submission order.
    pub fn spawn<S: TxSubmitter>(
        submitter: S,
        retry: RetryConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Completion<S::Receipt>>) {
        let (submit_tx, mut submit_rx) = mpsc::unbounded_channel::<ExecutionTask>();
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(mut task) = submit_rx.recv().await {
                let outcome = run_task(&submitter, &mut task, &retry).await;
                if done_tx.send(Completion { task, outcome }).is_err() {
                    // Session is gone; the result is discarded by design.
                    tracing::debug!("Completion dropped after session close");
                }
            }
        });

        (Self { submit_tx }, done_rx)
    }

    /// Enqueue a request. Fails only when the worker has terminated, in
    /// which case the request is handed back so the caller can still emit
    /// a correlated error.
    pub fn submit(&self, request: TransactionRequest) -> Result<(), TransactionRequest> {
        self.submit_tx
            .send(ExecutionTask::new(request))
            .map_err(|rejected| rejected.0.request)
    }
}

/// Run one task through the full retry budget.
///
/// Every attempt re-runs the whole build → sign → broadcast pipeline: a
/// stale nonce from a failed attempt requires rebuilding, so no step is
/// retried in isolation.
async fn run_task<S: TxSubmitter>(
    submitter: &S,
    task: &mut ExecutionTask,
    retry: &RetryConfig,
) -> LedgerResult<S::Receipt> {
    let max_attempts = retry.max_attempts.max(1);

    loop {
        task.attempts += 1;
        metrics::record_attempt();

        match submitter.submit(&task.request).await {
            Ok(receipt) => {
                tracing::info!(
                    request_id = task.request.id,
                    attempts = task.attempts,
                    "Transaction confirmed"
                );
                return Ok(receipt);
            }
            Err(err) => {
                if task.attempts >= max_attempts {
                    // Revert payloads are kept for diagnostics, not the wire.
                    if let crate::ledger::LedgerError::Reverted {
                        data: Some(revert_data),
                        ..
                    } = &err
                    {
                        tracing::error!(
                            request_id = task.request.id,
                            revert_data = %revert_data,
                            "Revert payload from final attempt"
                        );
                    }
                    tracing::error!(
                        request_id = task.request.id,
                        attempts = task.attempts,
                        error = %err,
                        "Transaction failed, attempt budget exhausted"
                    );
                    return Err(err);
                }

                let delay = calculate_backoff(task.attempts, retry.base_delay_ms, retry.max_delay_ms);
                tracing::warn!(
                    request_id = task.request.id,
                    attempt = task.attempts,
                    delay = ?delay,
                    error = %err,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
