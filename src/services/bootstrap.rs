//! Process start: bring up a session for every active tenant.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::domain::ports::TenantRepository;
use crate::services::session_registry::{SessionChange, SessionRegistry};

/// Load active tenants and start their sessions. Returns how many started.
///
/// A tenant whose clients cannot be built is logged and skipped.
pub async fn start_active_sessions(repo: &dyn TenantRepository, registry: &SessionRegistry) -> Result<usize> {
    let tenants = repo.list_active().await.context("Failed to load active tenants")?;

    let mut started = 0;
    for tenant in tenants.iter().filter(|t| t.active) {
        match registry.set_session(tenant) {
            Ok(SessionChange::Started) => started += 1,
            Ok(_) => {}
            Err(e) => warn!(client_id = %tenant.client_id, error = %e, "failed to start session"),
        }
    }

    info!(started, total = tenants.len(), "bootstrap complete");
    Ok(started)
}
