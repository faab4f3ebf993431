//! Infrastructure adapters for external systems.

pub mod alerting;
pub mod commerce;
pub mod factory;
pub mod gateway;
pub mod http;
pub mod mock;
pub mod sqlite;
