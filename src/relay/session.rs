//! Session lifecycle state machine.
//!
//! # States
//! ```text
//! Uninitialized ──connect/bind ok──▶ Ready ⇄ Busy ──close──▶ Closed
//!        │
//!        └─────bind failed──────────▶ Closed (no request ever accepted)
//! ```
//!
//! `Busy` describes the queue, not acceptance: new inbound frames are
//! accepted and enqueued while earlier work is still executing. The session
//! is driven by a single inbound event stream; there are no ambient event
//! emitters.

use tokio::sync::mpsc;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::protocol::{self, Frame, ServerMessage};
use crate::relay::correlate;
use crate::relay::queue::{Completion, ExecutionQueue, TxSubmitter};
use crate::relay::signer::{BindError, SignerBinder};

/// Lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created; signer not yet bound.
    Uninitialized,
    /// Bound and idle; accepting requests.
    Ready,
    /// Queue has work outstanding; still accepting requests.
    Busy,
    /// Terminal. No further frames accepted, no responses delivered.
    Closed,
}

/// One inbound event from the transport.
#[derive(Debug)]
pub enum SessionEvent {
    /// A message frame arrived.
    Frame(Frame),
    /// The peer disconnected or the transport failed.
    Closed,
}

/// Server-side state bound to one connected client and one signing identity.
#[derive(Debug)]
pub struct Session<S: TxSubmitter> {
    id: String,
    state: SessionState,
    queue: ExecutionQueue,
    completions: mpsc::UnboundedReceiver<Completion<S::Receipt>>,
    outstanding: usize,
}

impl<S: TxSubmitter> Session<S> {
    /// Create a session for `session_id`, resolving its signing credential.
    ///
    /// Binding happens exactly once, before any request is processed. A
    /// lookup failure is fatal: the session never reaches `Ready` and the
    /// caller must close the connection.
    pub async fn connect<B>(
        binder: &B,
        session_id: &str,
        retry: RetryConfig,
    ) -> Result<Session<S>, BindError>
    where
        B: SignerBinder<Submitter = S>,
    {
        let submitter = match binder.bind(session_id).await {
            Ok(submitter) => submitter,
            Err(err) => {
                tracing::error!(
                    session = %session_id,
                    error = %err,
                    "Signer binding failed; session will not start"
                );
                return Err(err);
            }
        };

        let (queue, completions) = ExecutionQueue::spawn(submitter, retry);
        tracing::info!(session = %session_id, "Session ready");

        Ok(Session {
            id: session_id.to_string(),
            state: SessionState::Ready,
            queue,
            completions,
            outstanding: 0,
        })
    }

    /// The session identifier (the user's address).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session until the transport closes.
    ///
    /// Consumes inbound events and queue completions concurrently; each
    /// valid request eventually produces exactly one outbound message, in
    /// submission order. On close, already-admitted tasks drain in the
    /// background with their results discarded.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(SessionEvent::Frame(frame)) => self.on_frame(frame, &outbound),
                    Some(SessionEvent::Closed) | None => break,
                },
                Some(completion) = self.completions.recv() => {
                    if !self.on_completion(completion, &outbound) {
                        break;
                    }
                }
            }
        }

        self.state = SessionState::Closed;
        tracing::info!(
            session = %self.id,
            outstanding = self.outstanding,
            "Session closed; admitted work drains with results discarded"
        );
    }

    fn on_frame(&mut self, frame: Frame, outbound: &mpsc::UnboundedSender<ServerMessage>) {
        match protocol::validate(&frame) {
            Ok(request) => {
                tracing::debug!(
                    session = %self.id,
                    request_id = request.id,
                    to = %request.to,
                    "Request accepted"
                );
                match self.queue.submit(request) {
                    Ok(()) => {
                        self.outstanding += 1;
                        self.state = SessionState::Busy;
                    }
                    // Worker gone; still owe this request its one response.
                    Err(request) => {
                        metrics::record_request("failed");
                        let _ = outbound.send(ServerMessage::Error {
                            message: "execution queue unavailable".into(),
                            id: Some(request.id),
                        });
                    }
                }
            }
            Err(err) => {
                metrics::record_request("rejected");
                tracing::warn!(session = %self.id, error = %err, "Rejected malformed frame");
                let _ = outbound.send(correlate::rejected(&err));
            }
        }
    }

    /// Deliver one completion. Returns false when the transport is gone.
    fn on_completion(
        &mut self,
        completion: Completion<S::Receipt>,
        outbound: &mpsc::UnboundedSender<ServerMessage>,
    ) -> bool {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.outstanding == 0 {
            self.state = SessionState::Ready;
        }

        let response = correlate::respond(completion);
        match &response {
            ServerMessage::TxSuccess { .. } => metrics::record_request("success"),
            ServerMessage::Error { .. } => metrics::record_request("failed"),
        }

        outbound.send(response).is_ok()
    }
}
