//! CLI command implementations.

pub mod migrate;
pub mod run;
pub mod tenants;
