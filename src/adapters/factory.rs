//! Production client factory.

use std::sync::Arc;

use crate::adapters::commerce::HttpCommerceClient;
use crate::adapters::gateway::{HttpGatewayClient, WsEventStreamConnector};
use crate::domain::errors::DomainResult;
use crate::domain::models::{HttpClientConfig, Tenant};
use crate::domain::ports::{ClientFactory, CommerceClient, GatewayClient, SessionClients};

/// Builds HTTP and WebSocket clients from tenant credentials.
#[derive(Debug, Clone, Default)]
pub struct HttpClientFactory {
    commerce: HttpClientConfig,
    gateway: HttpClientConfig,
}

impl HttpClientFactory {
    pub fn new(commerce: HttpClientConfig, gateway: HttpClientConfig) -> Self {
        Self { commerce, gateway }
    }
}

impl ClientFactory for HttpClientFactory {
    fn build(&self, tenant: &Tenant) -> DomainResult<SessionClients> {
        Ok(SessionClients {
            commerce: self.commerce(tenant)?,
            gateway: self.gateway(tenant)?,
            connector: Arc::new(WsEventStreamConnector::new()),
        })
    }

    fn commerce(&self, tenant: &Tenant) -> DomainResult<Arc<dyn CommerceClient>> {
        let commerce = HttpCommerceClient::new(&tenant.catalog_url, tenant.catalog_key.clone(), &self.commerce)?;
        Ok(Arc::new(commerce))
    }

    fn gateway(&self, tenant: &Tenant) -> DomainResult<Arc<dyn GatewayClient>> {
        let gateway = HttpGatewayClient::new(&tenant.gate_url, tenant.gate_token.clone(), &self.gateway)?;
        Ok(Arc::new(gateway))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builds_clients_from_tenant() {
        let tenant = Tenant::new("c1", "https://shop.example.com", "key")
            .with_gateway("https://mg.example.com", "token");
        let clients = HttpClientFactory::default().build(&tenant).unwrap();

        let params = clients.gateway.describe_socket(&["message_new"]).await.unwrap();
        assert!(params.url.starts_with("wss://mg.example.com/"));
    }
}
