//! WebSocket server for relay sessions.
//!
//! # Responsibilities
//! - Accept WebSocket upgrades at `/relay/{address}`
//! - Claim the address in the session registry before upgrading
//! - Bind the signer and drive the session over channel pumps
//! - Serialize outbound responses as JSON text frames
//!
//! # Data Flow
//! ```text
//! socket frames ──▶ event channel ──▶ Session::run ──▶ outbound channel ──▶ socket
//! ```

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use crate::config::{RelayConfig, RetryConfig};
use crate::identity::KeyStore;
use crate::protocol::Frame;
use crate::relay::{LedgerBinder, Session, SessionEvent};
use crate::transport::registry::{SessionClaim, SessionRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    binder: Arc<LedgerBinder<KeyStore>>,
    registry: Arc<SessionRegistry>,
    retry: RetryConfig,
}

/// WebSocket server hosting relay sessions.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
}

impl RelayServer {
    /// Create a new relay server with the given configuration.
    pub fn new(config: RelayConfig, binder: LedgerBinder<KeyStore>) -> Self {
        let state = AppState {
            binder: Arc::new(binder),
            registry: Arc::new(SessionRegistry::new(config.listener.max_sessions)),
            retry: config.retries.clone(),
        };

        let router = Router::new()
            .route("/relay/{address}", any(relay_handler))
            .route("/healthz", get(health_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        Self { router, config }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Relay server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("Relay server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Wait for ctrl-c or a coordinated shutdown trigger.
async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = shutdown.recv() => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Upgrade handler: one session per connection, one live session per address.
async fn relay_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(claim) = state.registry.claim(&address) else {
        tracing::warn!(
            session = %address,
            "Refusing connection: session already active or at capacity"
        );
        return (
            StatusCode::CONFLICT,
            "session already active for this address",
        )
            .into_response();
    };

    ws.on_upgrade(move |socket| handle_session(state, address, claim, socket))
}

/// Ledger reachability probe.
async fn health_handler(State(state): State<AppState>) -> Response {
    if state.binder.client().is_healthy().await {
        (StatusCode::OK, "ok").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "ledger unreachable").into_response()
    }
}

/// Drive one connection: bind the signer, then pump frames between the
/// socket and the session until either side closes.
async fn handle_session(
    state: AppState,
    address: String,
    claim: SessionClaim,
    mut socket: WebSocket,
) {
    // Held for the connection's lifetime; releases the address on drop.
    let _claim = claim;

    let session = match Session::connect(state.binder.as_ref(), &address, state.retry.clone()).await
    {
        Ok(session) => session,
        Err(err) => {
            tracing::error!(
                session = %address,
                error = %err,
                "Closing connection: no usable credential"
            );
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let session_task = tokio::spawn(session.run(event_rx, out_tx));

    // Outbound pump: responses → JSON text frames.
    let writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(text) => {
                    if ws_tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "Failed to encode outbound message");
                }
            }
        }
    });

    // Inbound pump: socket frames → session events.
    while let Some(message) = ws_rx.next().await {
        let event = match message {
            Ok(Message::Text(text)) => SessionEvent::Frame(Frame::Text(text.to_string())),
            Ok(Message::Binary(bytes)) => SessionEvent::Frame(Frame::Binary(bytes.to_vec())),
            Ok(Message::Close(_)) => SessionEvent::Closed,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(err) => {
                tracing::debug!(session = %address, error = %err, "WebSocket error");
                SessionEvent::Closed
            }
        };

        let closed = matches!(event, SessionEvent::Closed);
        if event_tx.send(event).is_err() || closed {
            break;
        }
    }
    // Socket gone or peer closed: end the event stream so the session
    // transitions to Closed and drains.
    drop(event_tx);

    let _ = session_task.await;
    let _ = writer.await;
    tracing::debug!(session = %address, "Connection torn down");
}
