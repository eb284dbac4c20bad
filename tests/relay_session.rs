//! End-to-end tests for the relay session over a real WebSocket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

mod common;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: std::net::SocketAddr, address: &str) -> Socket {
    let url = format!("ws://{}/relay/{}", addr, address);
    let (socket, _) = connect_async(url.as_str())
        .await
        .expect("WebSocket handshake failed");
    socket
}

/// Read frames until the next text frame, decoded as JSON.
async fn next_json(socket: &mut Socket) -> serde_json::Value {
    loop {
        let message = timeout(Duration::from_secs(10), socket.next())
            .await
            .expect("timed out waiting for a response")
            .expect("connection ended without a response")
            .expect("websocket error");

        match message {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

fn send_tx(id: i64) -> Message {
    Message::Text(
        serde_json::json!({
            "id": id,
            "type": "sendTransaction",
            "to": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "value": "0x0",
            "input": "0x",
        })
        .to_string()
        .into(),
    )
}

#[tokio::test]
async fn malformed_frame_yields_error_without_id() {
    let (addr, shutdown) = common::start_relay().await;
    let mut socket = connect(addr, common::TEST_ADDRESS).await;

    socket.send(Message::Text("not json".into())).await.unwrap();

    let response = next_json(&mut socket).await;
    assert_eq!(response["type"], "error");
    assert!(response.get("id").is_none());
    assert!(!response["message"].as_str().unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn missing_field_yields_error_without_id() {
    let (addr, shutdown) = common::start_relay().await;
    let mut socket = connect(addr, common::TEST_ADDRESS).await;

    socket
        .send(Message::Text(
            r#"{"id":1,"type":"sendTransaction","to":"0xabc"}"#.into(),
        ))
        .await
        .unwrap();

    let response = next_json(&mut socket).await;
    assert_eq!(response["type"], "error");
    assert!(response.get("id").is_none());
    assert!(response["message"].as_str().unwrap().contains("value"));

    shutdown.trigger();
}

#[tokio::test]
async fn unreachable_ledger_yields_correlated_error_after_retries() {
    let (addr, shutdown) = common::start_relay().await;
    let mut socket = connect(addr, common::TEST_ADDRESS).await;

    socket.send(send_tx(7)).await.unwrap();

    let response = next_json(&mut socket).await;
    assert_eq!(response["type"], "error");
    assert_eq!(response["id"], 7);
    assert!(response["message"]
        .as_str()
        .unwrap()
        .contains("all RPC providers failed"));

    shutdown.trigger();
}

#[tokio::test]
async fn responses_preserve_submission_order() {
    let (addr, shutdown) = common::start_relay().await;
    let mut socket = connect(addr, common::TEST_ADDRESS).await;

    socket.send(send_tx(1)).await.unwrap();
    socket.send(send_tx(2)).await.unwrap();

    let first = next_json(&mut socket).await;
    let second = next_json(&mut socket).await;
    assert_eq!(first["id"], 1);
    assert_eq!(second["id"], 2);

    shutdown.trigger();
}

#[tokio::test]
async fn unknown_address_is_closed_without_accepting_requests() {
    let (addr, shutdown) = common::start_relay().await;
    // Handshake succeeds; the session then fails to bind and closes.
    let mut socket = connect(addr, "0x0000000000000000000000000000000000000001").await;

    let mut saw_text = false;
    while let Ok(Some(message)) = timeout(Duration::from_secs(5), socket.next()).await {
        match message {
            Ok(Message::Text(_)) => {
                saw_text = true;
                break;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => continue,
        }
    }
    assert!(!saw_text, "session without a credential must not respond");

    shutdown.trigger();
}

#[tokio::test]
async fn second_connection_for_same_address_is_refused() {
    let (addr, shutdown) = common::start_relay().await;
    let socket = connect(addr, common::TEST_ADDRESS).await;

    let url = format!("ws://{}/relay/{}", addr, common::TEST_ADDRESS);
    let second = connect_async(url.as_str()).await;
    assert!(second.is_err(), "duplicate session should be refused");

    // Releasing the first session frees the address.
    drop(socket);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let third = connect_async(url.as_str()).await;
    assert!(third.is_ok());

    shutdown.trigger();
}
