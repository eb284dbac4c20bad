//! Transport subsystem: WebSocket endpoint and session routing.
//!
//! # Data Flow
//! ```text
//! Client ──── WebSocket frames ────▶ server.rs ──── events ────▶ relay::Session
//!        ◀─── JSON text frames ────            ◀── responses ──
//! ```
//!
//! # Design Decisions
//! - The relay core never sees the socket; it consumes a channel of
//!   [`SessionEvent`]s and produces a channel of [`ServerMessage`]s
//! - One session per connection; the registry refuses a second concurrent
//!   connection for an address already holding a live session
//!
//! [`SessionEvent`]: crate::relay::SessionEvent
//! [`ServerMessage`]: crate::protocol::ServerMessage

pub mod registry;
pub mod server;

pub use registry::SessionRegistry;
pub use server::RelayServer;
