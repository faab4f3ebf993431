use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::Tenant;

use super::{CommerceClient, EventStreamConnector, GatewayClient};

/// Remote handles a session owns for its whole lifetime.
#[derive(Clone)]
pub struct SessionClients {
    pub commerce: Arc<dyn CommerceClient>,
    pub gateway: Arc<dyn GatewayClient>,
    pub connector: Arc<dyn EventStreamConnector>,
}

/// Builds remote handles from a tenant's credentials.
pub trait ClientFactory: Send + Sync {
    fn build(&self, tenant: &Tenant) -> DomainResult<SessionClients>;

    /// Commerce client alone, used while a tenant is being set up
    fn commerce(&self, tenant: &Tenant) -> DomainResult<Arc<dyn CommerceClient>> {
        Ok(self.build(tenant)?.commerce)
    }

    /// Gateway client alone, used for command registration
    fn gateway(&self, tenant: &Tenant) -> DomainResult<Arc<dyn GatewayClient>> {
        Ok(self.build(tenant)?.gateway)
    }
}
