use async_trait::async_trait;
use thiserror::Error;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GatewayEvent, OutboundMessage, SocketParams};

/// Messaging gateway operations used by a session.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Obtain event-stream connection parameters for the given event types
    async fn describe_socket(&self, events: &[&str]) -> DomainResult<SocketParams>;

    /// Deliver a reply
    async fn send_message(&self, message: &OutboundMessage) -> DomainResult<()>;

    /// Register (or update) a bot command
    async fn register_command(&self, name: &str, description: &str) -> DomainResult<()>;
}

/// Failure while reading from an open event stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The socket is gone; the session must redial.
    #[error("unexpected disconnect: {0}")]
    Disconnected(String),

    /// One frame could not be decoded; the socket stays usable.
    #[error("failed to decode event: {0}")]
    Decode(String),
}

impl StreamError {
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected(_))
    }
}

impl From<StreamError> for DomainError {
    fn from(err: StreamError) -> Self {
        DomainError::EventStream(err.to_string())
    }
}

/// One open event-stream connection. Single reader.
#[async_trait]
pub trait EventStream: Send {
    async fn next_event(&mut self) -> Result<GatewayEvent, StreamError>;
}

/// Dials event-stream connections.
#[async_trait]
pub trait EventStreamConnector: Send + Sync {
    async fn connect(&self, params: &SocketParams) -> DomainResult<Box<dyn EventStream>>;
}
