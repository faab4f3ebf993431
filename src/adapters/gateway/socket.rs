//! WebSocket event stream of the messaging gateway.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GatewayEvent, SocketParams};
use crate::domain::ports::{EventStream, EventStreamConnector, StreamError};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials gateway event streams over WebSocket.
#[derive(Debug, Clone, Default)]
pub struct WsEventStreamConnector;

impl WsEventStreamConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventStreamConnector for WsEventStreamConnector {
    async fn connect(&self, params: &SocketParams) -> DomainResult<Box<dyn EventStream>> {
        let mut request = params
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| DomainError::EventStream(format!("invalid socket URL: {e}")))?;

        for (name, value) in &params.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DomainError::EventStream(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| DomainError::EventStream(format!("invalid header value: {e}")))?;
            request.headers_mut().insert(name, value);
        }

        let (socket, _) = connect_async(request)
            .await
            .map_err(|e| DomainError::EventStream(format!("dial failed: {e}")))?;

        tracing::debug!(url = %params.url, "event stream connected");
        Ok(Box::new(WsEventStream { socket }))
    }
}

/// One open gateway socket.
pub struct WsEventStream {
    socket: Socket,
}

#[async_trait]
impl EventStream for WsEventStream {
    async fn next_event(&mut self) -> Result<GatewayEvent, StreamError> {
        loop {
            let Some(frame) = self.socket.next().await else {
                return Err(StreamError::Disconnected("stream ended".to_string()));
            };
            let frame = frame.map_err(|e| StreamError::Disconnected(e.to_string()))?;

            match frame {
                WsMessage::Text(text) => {
                    return decode_event(text.as_str());
                }
                WsMessage::Close(close) => {
                    let reason = close.map_or_else(
                        || "close frame".to_string(),
                        |c| format!("close frame {}: {}", c.code, c.reason),
                    );
                    return Err(StreamError::Disconnected(reason));
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Binary(_) | WsMessage::Frame(_) => {}
            }
        }
    }
}

fn decode_event(text: &str) -> Result<GatewayEvent, StreamError> {
    serde_json::from_str(text).map_err(|e| StreamError::Decode(e.to_string()))
}
