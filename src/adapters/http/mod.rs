//! Inbound HTTP surface.

pub mod activity_http;

pub use activity_http::{ActivityHttpServer, HttpState};
