//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the session core depends on:
//! - TenantRepository: durable tenant records
//! - CommerceClient: catalog and reference data reads
//! - GatewayClient / EventStreamConnector: messaging gateway transport
//! - AlertSink: external error tracking
//! - ClientFactory: per-tenant construction of the remote handles

pub mod alert_sink;
pub mod client_factory;
pub mod commerce_client;
pub mod gateway_client;
pub mod tenant_repository;

pub use alert_sink::AlertSink;
pub use client_factory::{ClientFactory, SessionClients};
pub use commerce_client::CommerceClient;
pub use gateway_client::{EventStream, EventStreamConnector, GatewayClient, StreamError};
pub use tenant_repository::TenantRepository;
