//! Commerce backend adapter (REST API v5).

pub mod client;

pub use client::{HttpCommerceClient, API_PREFIX};
