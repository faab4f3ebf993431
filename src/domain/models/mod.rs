//! Domain models.

pub mod catalog;
pub mod command;
pub mod config;
pub mod gateway;
pub mod integration;
pub mod tenant;

pub use catalog::{DeliveryType, Offer, PaymentType, Product, ProductFilter, Unit};
pub use command::{CommandKind, ParsedCommand};
pub use config::{
    AlertingConfig, BotInfoConfig, Config, DatabaseConfig, HttpClientConfig, HttpServerConfig,
    LoggingConfig, SessionConfig,
};
pub use gateway::{
    ChatMessage, GatewayEvent, MessageBody, MessageCost, MessageNewData, MessageProduct,
    MessageQuantity, MessageScope, OutboundMessage, SocketParams, EVENT_MESSAGE_NEW,
    MESSAGE_TYPE_COMMAND,
};
pub use integration::{
    missing_credentials, required_credentials, BotRegistration, IntegrationModule, IntegrationSettings,
    ModuleIntegrations,
};
pub use tenant::{generate_client_id, normalize_catalog_url, Activity, Tenant};
