//! `bot-helper run`: start every active session and serve the webhooks.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::adapters::alerting::build_alert_sink;
use crate::adapters::factory::HttpClientFactory;
use crate::adapters::http::ActivityHttpServer;
use crate::adapters::sqlite::{initialize_database, SqliteTenantRepository};
use crate::domain::models::Config;
use crate::domain::ports::{ClientFactory, TenantRepository};
use crate::infrastructure::localization::Translations;
use crate::infrastructure::logging::LoggerImpl;
use crate::services::{start_active_sessions, SessionRegistry, TenantService};

/// Run until Ctrl-C, then stop all sessions.
pub async fn execute(config: Config) -> Result<()> {
    let _logger = LoggerImpl::init(&config.effective_logging())?;
    info!(
        bot = %config.bot_info.name,
        code = %config.bot_info.code,
        host = %config.http_server.host,
        version = %config.version,
        debug = config.debug,
        "starting"
    );

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    let repo: Arc<dyn TenantRepository> = Arc::new(SqliteTenantRepository::new(pool.clone()));

    let translations = Arc::new(
        Translations::embedded(&config.session.default_lang).context("Failed to load translations")?,
    );
    for lang in translations.languages() {
        let missing = translations.missing_keys(lang);
        if !missing.is_empty() {
            warn!(lang, ?missing, "translation catalog is incomplete");
        }
    }

    let alert_sink = build_alert_sink(&config.alerting).context("Failed to configure alerting")?;
    let factory: Arc<dyn ClientFactory> = Arc::new(HttpClientFactory::new(
        config.commerce.clone(),
        config.gateway.clone(),
    ));
    let registry = Arc::new(SessionRegistry::new(
        factory.clone(),
        translations.clone(),
        alert_sink,
        &config.session,
    )
    .with_debug(config.debug));

    start_active_sessions(repo.as_ref(), &registry).await?;

    let tenants = Arc::new(
        TenantService::new(repo, registry.clone(), factory, translations).with_integration(config.integration()),
    );
    let listener = TcpListener::bind(&config.http_server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.http_server.listen))?;

    let served = ActivityHttpServer::new(tenants, config.version.clone())
        .serve_with_shutdown(listener, shutdown_signal())
        .await;

    info!(sessions = registry.len(), "shutting down");
    registry.shutdown().await;
    pool.close().await;

    served.context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
