//! In-memory commerce backend.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    required_credentials, BotRegistration, DeliveryType, IntegrationModule, IntegrationSettings, PaymentType,
    Product, ProductFilter,
};
use crate::domain::ports::CommerceClient;

/// Gateway access handed out by `integration_module_edit` unless overridden.
pub const MOCK_GATEWAY_URL: &str = "https://mg.example.com";
pub const MOCK_GATEWAY_TOKEN: &str = "token";

#[derive(Debug, Default)]
struct State {
    payment_types: Vec<PaymentType>,
    delivery_types: Vec<DeliveryType>,
    products: Vec<Product>,
    product_queries: Vec<String>,
    reference_calls: usize,
    failure: Option<String>,
    gate: Option<Arc<Notify>>,
    credentials: Option<Vec<String>>,
    credentials_failure: Option<String>,
    registration: Option<BotRegistration>,
    integration_failure: Option<String>,
    modules: Vec<IntegrationModule>,
}

/// Serves canned catalog data and records product queries.
#[derive(Debug, Default)]
pub struct MockCommerceClient {
    state: Mutex<State>,
}

impl MockCommerceClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_payment_types(self, types: Vec<PaymentType>) -> Self {
        self.state().payment_types = types;
        self
    }

    pub fn with_delivery_types(self, types: Vec<DeliveryType>) -> Self {
        self.state().delivery_types = types;
        self
    }

    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.state().products = products;
        self
    }

    /// Make every call fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.state().failure = Some(message.into());
    }

    /// Hold every reference list call until `gate` is notified.
    pub fn block_on(&self, gate: Arc<Notify>) {
        self.state().gate = Some(gate);
    }

    /// Grant exactly `credentials`. Without this every required credential
    /// of the default integration code is granted.
    pub fn with_credentials(self, credentials: Vec<String>) -> Self {
        self.state().credentials = Some(credentials);
        self
    }

    pub fn fail_credentials(&self, message: impl Into<String>) {
        self.state().credentials_failure = Some(message.into());
    }

    pub fn with_registration(self, registration: BotRegistration) -> Self {
        self.state().registration = Some(registration);
        self
    }

    pub fn fail_integration(&self, message: impl Into<String>) {
        self.state().integration_failure = Some(message.into());
    }

    /// Modules passed to `integration_module_edit`, in call order.
    pub fn modules(&self) -> Vec<IntegrationModule> {
        self.state().modules.clone()
    }

    /// Wait until at least `count` reference list calls started.
    pub async fn wait_for_reference_calls(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.reference_calls() < count {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    }

    async fn enter_reference_call(&self) {
        let gate = {
            let mut state = self.state();
            state.reference_calls += 1;
            state.gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    /// Filters passed to `products`, in call order.
    pub fn product_queries(&self) -> Vec<String> {
        self.state().product_queries.clone()
    }

    /// Number of payment/delivery list calls.
    pub fn reference_calls(&self) -> usize {
        self.state().reference_calls
    }

    fn check_failure(state: &State) -> DomainResult<()> {
        match &state.failure {
            Some(msg) => Err(DomainError::CommerceApi(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommerceClient for MockCommerceClient {
    async fn payment_types(&self) -> DomainResult<Vec<PaymentType>> {
        self.enter_reference_call().await;
        let state = self.state();
        Self::check_failure(&state)?;
        Ok(state.payment_types.clone())
    }

    async fn delivery_types(&self) -> DomainResult<Vec<DeliveryType>> {
        self.enter_reference_call().await;
        let state = self.state();
        Self::check_failure(&state)?;
        Ok(state.delivery_types.clone())
    }

    async fn products(&self, filter: &ProductFilter) -> DomainResult<Vec<Product>> {
        let mut state = self.state();
        state.product_queries.push(filter.name.clone());
        Self::check_failure(&state)?;
        Ok(state.products.clone())
    }

    async fn credentials(&self) -> DomainResult<Vec<String>> {
        let state = self.state();
        if let Some(msg) = &state.credentials_failure {
            return Err(DomainError::CommerceApi(msg.clone()));
        }
        Ok(state
            .credentials
            .clone()
            .unwrap_or_else(|| required_credentials(&IntegrationSettings::default().code)))
    }

    async fn integration_module_edit(&self, module: &IntegrationModule) -> DomainResult<BotRegistration> {
        let mut state = self.state();
        state.modules.push(module.clone());
        if let Some(msg) = &state.integration_failure {
            return Err(DomainError::CommerceApi(msg.clone()));
        }
        Ok(state.registration.clone().unwrap_or_else(|| BotRegistration {
            endpoint_url: MOCK_GATEWAY_URL.to_string(),
            token: MOCK_GATEWAY_TOKEN.to_string(),
        }))
    }
}
