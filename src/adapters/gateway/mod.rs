//! Messaging gateway adapters: bot REST API and WebSocket event stream.

pub mod client;
pub mod socket;

pub use client::{HttpGatewayClient, API_PREFIX, TOKEN_HEADER};
pub use socket::{WsEventStream, WsEventStreamConnector};
