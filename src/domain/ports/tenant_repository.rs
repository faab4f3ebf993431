use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Tenant;

/// Repository port for tenant persistence operations
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Insert a new tenant
    async fn create(&self, tenant: &Tenant) -> DomainResult<()>;

    /// Get a tenant by client identifier
    async fn get_by_client_id(&self, client_id: &str) -> DomainResult<Option<Tenant>>;

    /// Get a tenant by (normalized) catalog URL
    async fn get_by_catalog_url(&self, catalog_url: &str) -> DomainResult<Option<Tenant>>;

    /// List tenants flagged active
    async fn list_active(&self) -> DomainResult<Vec<Tenant>>;

    /// List every tenant
    async fn list_all(&self) -> DomainResult<Vec<Tenant>>;

    /// Overwrite every mutable column of an existing tenant
    async fn save(&self, tenant: &Tenant) -> DomainResult<()>;

    /// Update only the activity flag and catalog URL
    async fn set_activity(&self, client_id: &str, active: bool, catalog_url: &str) -> DomainResult<()>;
}
