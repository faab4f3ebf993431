//! Bot Helper - catalog answers for messaging gateway tenants
//!
//! Many tenants share one process. Each active tenant keeps a live event
//! stream to the messaging gateway, answers `/payment`, `/delivery` and
//! `/product` commands from its commerce catalog, and replies in the tenant's
//! language and currency.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): tenant, catalog and gateway models, ports, errors
//! - **Adapters** (`adapters`): SQLite store, HTTP/WebSocket clients, webhooks, mocks
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, localization
//! - **Service Layer** (`services`): sessions, registry, command resolution, tenant lifecycle
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{Config, Tenant};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{SessionRegistry, TenantService};
