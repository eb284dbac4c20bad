//! Relay core: per-session request execution.
//!
//! # Data Flow
//! ```text
//! transport frames
//!     → session.rs (lifecycle state machine, one event stream per session)
//!     → protocol::validate
//!     → queue.rs (strict FIFO, single worker, bounded retry)
//!     → signer.rs (build → sign → broadcast via the bound credential)
//!     → correlate.rs (exactly one response per request)
//!     → transport sink
//! ```
//!
//! # Design Decisions
//! - Concurrency is exactly 1 within a session; sessions are independent
//! - The signing credential is bound once per session and owned by the
//!   queue worker for the session's lifetime
//! - Every admitted task resolves to exactly one outcome

pub mod correlate;
pub mod queue;
pub mod session;
pub mod signer;

#[cfg(test)]
pub(crate) mod testing;

pub use queue::{Completion, ExecutionQueue, ExecutionTask, TxSubmitter};
pub use session::{Session, SessionEvent, SessionState};
pub use signer::{BindError, BoundSigner, LedgerBinder, SignerBinder};
