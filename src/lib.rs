//! Transaction Relay Service Library
//!
//! Relays signed blockchain transactions on behalf of connected users over
//! persistent WebSocket sessions.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                  TRANSACTION RELAY                   │
//!                    │                                                      │
//!  WebSocket frames  │  ┌───────────┐    ┌──────────┐    ┌─────────────┐    │
//!  ──────────────────┼─▶│ transport │───▶│ protocol │───▶│   relay     │    │
//!                    │  │ ws server │    │ validate │    │  session    │    │
//!                    │  └───────────┘    └──────────┘    └──────┬──────┘    │
//!                    │                                          │           │
//!                    │                                          ▼           │
//!                    │                                   ┌─────────────┐    │
//!                    │                                   │  execution  │    │
//!                    │                                   │ queue (FIFO)│    │
//!                    │                                   └──────┬──────┘    │
//!                    │                                          │           │
//!  Response frames   │  ┌───────────┐    ┌──────────┐    ┌──────▼──────┐    │
//!  ◀─────────────────┼──│ transport │◀───│correlate │◀───│   ledger    │────┼──▶ JSON-RPC
//!                    │  │  ws sink  │    │responses │    │ build/sign/ │    │    endpoint
//!                    │  └───────────┘    └──────────┘    │  broadcast  │    │
//!                    │                                   └─────────────┘    │
//!                    │                                                      │
//!                    │  ┌────────────────────────────────────────────────┐  │
//!                    │  │             Cross-Cutting Concerns             │  │
//!                    │  │  ┌────────┐ ┌──────────┐ ┌──────────────────┐  │  │
//!                    │  │  │ config │ │ identity │ │  observability   │  │  │
//!                    │  │  └────────┘ └──────────┘ └──────────────────┘  │  │
//!                    │  │  ┌─────────────────┐  ┌─────────────────────┐  │  │
//!                    │  │  │   resilience    │  │      lifecycle      │  │  │
//!                    │  │  │ backoff/retry   │  │  startup/shutdown   │  │  │
//!                    │  │  └─────────────────┘  └─────────────────────┘  │  │
//!                    │  └────────────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod identity;
pub mod ledger;
pub mod protocol;
pub mod relay;
pub mod transport;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::RelayConfig;
pub use lifecycle::Shutdown;
pub use transport::RelayServer;
