//! Domain layer for the bot helper
//!
//! This module contains the tenant, catalog and gateway models, the port
//! traits adapters implement, and the shared error type.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
