//! Infrastructure layer
//!
//! Process-level concerns shared by every adapter and service:
//! - Configuration loading (figment)
//! - Logging setup (tracing)
//! - Localization catalogs

pub mod config;
pub mod localization;
pub mod logging;
