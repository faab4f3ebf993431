//! Common test utilities for integration tests
//!
//! Builds an in-memory tenant store, a registry over mock clients and the
//! tenant service on top of both.

use std::sync::Arc;
use std::time::Duration;

use bot_helper::adapters::mock::{MockClientFactory, RecordingAlertSink};
use bot_helper::adapters::sqlite::{create_migrated_test_pool, SqliteTenantRepository};
use bot_helper::domain::models::{GatewayEvent, SessionConfig, Tenant};
use bot_helper::infrastructure::localization::Translations;
use bot_helper::services::{SessionRegistry, TenantService};
use serde_json::json;

#[allow(dead_code)]
pub const WAIT: Duration = Duration::from_secs(2);

#[allow(dead_code)]
pub struct TestEnv {
    pub repo: Arc<SqliteTenantRepository>,
    pub factory: Arc<MockClientFactory>,
    pub alerts: Arc<RecordingAlertSink>,
    pub registry: Arc<SessionRegistry>,
    pub service: TenantService,
}

/// Fresh store, registry and service with fast backoffs.
pub async fn test_env() -> TestEnv {
    let repo = Arc::new(SqliteTenantRepository::new(
        create_migrated_test_pool().await.expect("Failed to create test pool"),
    ));
    let factory = Arc::new(MockClientFactory::new());
    let alerts = Arc::new(RecordingAlertSink::new());
    let translations = Arc::new(Translations::embedded("en").expect("Failed to load translations"));
    let registry = Arc::new(SessionRegistry::new(
        factory.clone(),
        translations.clone(),
        alerts.clone(),
        &SessionConfig {
            dial_backoff_ms: 10,
            redial_backoff_ms: 0,
            ..SessionConfig::default()
        },
    ));
    let service = TenantService::new(repo.clone(), registry.clone(), factory.clone(), translations);

    TestEnv {
        repo,
        factory,
        alerts,
        registry,
        service,
    }
}

/// Tenant awaiting registration, English replies in USD. The mock commerce
/// backend issues its gateway access.
#[allow(dead_code)]
pub fn tenant(client_id: &str, catalog_url: &str, active: bool) -> Tenant {
    Tenant::new(client_id, catalog_url, "key")
        .with_active(active)
        .with_lang("en")
        .with_currency("usd")
}

/// A `message_new` event carrying a command.
#[allow(dead_code)]
pub fn command_event(chat_id: u64, content: &str) -> GatewayEvent {
    serde_json::from_value(json!({
        "type": "message_new",
        "data": {"message": {"id": 1, "type": "command", "content": content, "chat_id": chat_id}}
    }))
    .expect("valid event")
}

/// Poll `predicate` every 5ms until it holds or `timeout` passes.
#[allow(dead_code)]
pub async fn wait_until<F>(mut predicate: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    predicate()
}
