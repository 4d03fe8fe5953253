//! Home Assistant websocket event subscription
//!
//! ```text
//! connect → auth_required → {"type":"auth"} → auth_ok
//!         → {"type":"subscribe_events"} → result(success)
//!         → event, event, ...
//! ```

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::ControllerError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Authenticated subscription to one Home Assistant event type
pub struct EventStream {
    socket: Socket,
    event_type: String,
}

impl EventStream {
    /// Connect, authenticate and subscribe to `event_type`.
    pub async fn subscribe(
        url: &str,
        token: &str,
        event_type: &str,
    ) -> Result<Self, ControllerError> {
        let (socket, _) = connect_async(url).await?;
        let mut stream = Self {
            socket,
            event_type: event_type.to_string(),
        };

        // The server may greet with auth_required before accepting credentials
        let mut msg = stream.recv_json().await?;
        if msg["type"] == "auth_required" {
            stream
                .send_json(json!({ "type": "auth", "access_token": token }))
                .await?;
            msg = stream.recv_json().await?;
        }
        if msg["type"] != "auth_ok" {
            let reason = msg["message"].as_str().unwrap_or("unexpected reply");
            return Err(ControllerError::Auth(reason.to_string()));
        }

        stream
            .send_json(json!({
                "id": 1,
                "type": "subscribe_events",
                "event_type": event_type,
            }))
            .await?;
        let reply = stream.recv_json().await?;
        if reply["type"] != "result" || reply["success"] != true {
            return Err(ControllerError::Subscribe(reply.to_string()));
        }

        info!("Subscribed to {} events", event_type);
        Ok(stream)
    }

    /// Wait for the next event and return its `data` payload.
    ///
    /// Returns `Ok(None)` once the server closes the connection.
    pub async fn next_event(&mut self) -> Result<Option<Value>, ControllerError> {
        loop {
            let msg = match self.recv_json().await {
                Ok(msg) => msg,
                Err(ControllerError::Closed) => return Ok(None),
                Err(e) => return Err(e),
            };
            if msg["type"] == "event" {
                let event = &msg["event"];
                if event["event_type"] == self.event_type.as_str() {
                    return Ok(Some(event["data"].clone()));
                }
            }
            debug!(kind = %msg["type"], "ignoring websocket message");
        }
    }

    /// Close the websocket.
    pub async fn close(mut self) -> Result<(), ControllerError> {
        self.socket.close(None).await?;
        Ok(())
    }

    async fn send_json(&mut self, value: Value) -> Result<(), ControllerError> {
        self.socket.send(Message::Text(value.to_string())).await?;
        Ok(())
    }

    async fn recv_json(&mut self) -> Result<Value, ControllerError> {
        while let Some(frame) = self.socket.next().await {
            match frame? {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Ping(payload) => self.socket.send(Message::Pong(payload)).await?,
                Message::Close(_) => return Err(ControllerError::Closed),
                _ => {}
            }
        }
        Err(ControllerError::Closed)
    }
}
