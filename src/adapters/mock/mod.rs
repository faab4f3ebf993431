//! In-memory port implementations for tests and local experiments.

pub mod commerce;
pub mod gateway;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

pub use commerce::{MockCommerceClient, MOCK_GATEWAY_TOKEN, MOCK_GATEWAY_URL};
pub use gateway::{MockEventStreamConnector, MockGatewayClient};

use crate::domain::errors::DomainResult;
use crate::domain::models::Tenant;
use crate::domain::ports::{AlertSink, ClientFactory, CommerceClient, GatewayClient, SessionClients};

/// The concrete mocks behind one tenant's [`SessionClients`].
#[derive(Debug, Clone, Default)]
pub struct MockClients {
    pub commerce: Arc<MockCommerceClient>,
    pub gateway: Arc<MockGatewayClient>,
    pub connector: Arc<MockEventStreamConnector>,
}

impl MockClients {
    pub fn session_clients(&self) -> SessionClients {
        SessionClients {
            commerce: self.commerce.clone(),
            gateway: self.gateway.clone(),
            connector: self.connector.clone(),
        }
    }
}

/// Hands out one [`MockClients`] set per client id, created on first use.
#[derive(Debug, Default)]
pub struct MockClientFactory {
    clients: Mutex<HashMap<String, MockClients>>,
    fallback: Mutex<Option<MockClients>>,
    builds: Mutex<Vec<Tenant>>,
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mocks used for `client_id`, shared with every session built for it.
    pub fn clients_for(&self, client_id: &str) -> MockClients {
        let fallback = self.fallback.lock().unwrap_or_else(PoisonError::into_inner).clone();
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(client_id.to_string())
            .or_insert_with(|| fallback.unwrap_or_default())
            .clone()
    }

    /// Mocks shared by every client id not seen before, such as generated ones.
    pub fn set_fallback(&self, clients: MockClients) {
        *self.fallback.lock().unwrap_or_else(PoisonError::into_inner) = Some(clients);
    }

    /// Install preconfigured mocks for `client_id`.
    pub fn insert(&self, client_id: &str, clients: MockClients) {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(client_id.to_string(), clients);
    }

    /// Tenant snapshots passed to `build`, in call order.
    pub fn builds(&self) -> Vec<Tenant> {
        self.builds.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ClientFactory for MockClientFactory {
    fn build(&self, tenant: &Tenant) -> DomainResult<SessionClients> {
        self.builds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tenant.clone());
        Ok(self.clients_for(&tenant.client_id).session_clients())
    }

    fn commerce(&self, tenant: &Tenant) -> DomainResult<Arc<dyn CommerceClient>> {
        Ok(self.clients_for(&tenant.client_id).commerce)
    }

    fn gateway(&self, tenant: &Tenant) -> DomainResult<Arc<dyn GatewayClient>> {
        Ok(self.clients_for(&tenant.client_id).gateway)
    }
}

/// Keeps every captured alert.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<(String, BTreeMap<String, String>)>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Wait until at least `count` alerts arrived or `timeout` elapses.
    pub async fn wait_for(&self, count: usize, timeout: std::time::Duration) -> Vec<(String, BTreeMap<String, String>)> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let alerts = self.alerts();
            if alerts.len() >= count || tokio::time::Instant::now() >= deadline {
                return alerts;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn capture(&self, error: &str, tags: &BTreeMap<String, String>) {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((error.to_string(), tags.clone()));
    }
}
