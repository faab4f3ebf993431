use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{BotRegistration, DeliveryType, IntegrationModule, PaymentType, Product, ProductFilter};

/// A tenant's commerce backend: catalog reads plus integration setup.
#[async_trait]
pub trait CommerceClient: Send + Sync {
    /// Payment methods in source order
    async fn payment_types(&self) -> DomainResult<Vec<PaymentType>>;

    /// Delivery methods in source order
    async fn delivery_types(&self) -> DomainResult<Vec<DeliveryType>>;

    /// Products matching the name predicate
    async fn products(&self, filter: &ProductFilter) -> DomainResult<Vec<Product>>;

    /// Permissions granted to the API key
    async fn credentials(&self) -> DomainResult<Vec<String>>;

    /// Create or update the integration module; returns the issued gateway access.
    async fn integration_module_edit(&self, module: &IntegrationModule) -> DomainResult<BotRegistration>;
}
