//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty stdout formatting
//! - Optional daily-rolling JSON log files

pub mod logger;

pub use logger::LoggerImpl;
