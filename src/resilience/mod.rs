//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Task execution attempt fails:
//!     → backoff.rs (compute jittered delay for the next attempt)
//!     → relay::queue (sleep, then re-run the attempt)
//! ```
//!
//! # Design Decisions
//! - Attempt budgets and delay bounds are explicit configuration
//! - Jittered backoff prevents synchronized retry bursts across sessions

pub mod backoff;

pub use backoff::calculate_backoff;
