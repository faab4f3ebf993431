//! Tenant lifecycle: registration, credential and activity changes,
//! settings updates.
//!
//! Every operation persists first and then tells the registry, so the store
//! stays the source of truth when the process restarts.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    generate_client_id, missing_credentials, normalize_catalog_url, required_credentials, Activity, CommandKind,
    IntegrationSettings, Tenant,
};
use crate::domain::ports::{ClientFactory, CommerceClient, TenantRepository};
use crate::infrastructure::localization::Translations;
use crate::services::session_registry::SessionRegistry;

pub struct TenantService {
    repo: Arc<dyn TenantRepository>,
    registry: Arc<SessionRegistry>,
    factory: Arc<dyn ClientFactory>,
    translations: Arc<Translations>,
    integration: IntegrationSettings,
}

impl TenantService {
    pub fn new(
        repo: Arc<dyn TenantRepository>,
        registry: Arc<SessionRegistry>,
        factory: Arc<dyn ClientFactory>,
        translations: Arc<Translations>,
    ) -> Self {
        Self {
            repo,
            registry,
            factory,
            translations,
            integration: IntegrationSettings::default(),
        }
    }

    /// Identity announced when registering the integration module.
    pub fn with_integration(mut self, integration: IntegrationSettings) -> Self {
        self.integration = integration;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn translations(&self) -> &Arc<Translations> {
        &self.translations
    }

    async fn require(&self, client_id: &str) -> DomainResult<Tenant> {
        self.repo
            .get_by_client_id(client_id)
            .await?
            .ok_or_else(|| DomainError::TenantNotFound(client_id.to_string()))
    }

    /// Fail unless the API key holds every credential the integration needs.
    async fn check_credentials(&self, commerce: &dyn CommerceClient) -> DomainResult<()> {
        let granted = commerce.credentials().await?;
        let missing = missing_credentials(&granted, &required_credentials(&self.integration.code));
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::MissingCredentials(missing))
        }
    }

    /// Apply an activity change reported by the commerce backend.
    ///
    /// A non-empty `system_url` replaces the catalog URL.
    #[instrument(skip(self), err)]
    pub async fn apply_activity(
        &self,
        client_id: &str,
        activity: Activity,
        system_url: Option<&str>,
    ) -> DomainResult<Tenant> {
        let mut tenant = self.require(client_id).await?;

        tenant.active = activity.is_effective();
        if let Some(url) = system_url.filter(|url| !url.is_empty()) {
            tenant.catalog_url = url.to_string();
        }
        tenant.normalize_catalog_url();
        tenant.touch();

        self.repo
            .set_activity(&tenant.client_id, tenant.active, &tenant.catalog_url)
            .await?;

        if tenant.active {
            self.registry.set_session(&tenant)?;
        } else {
            self.registry.stop_session(&tenant.client_id);
        }

        info!(client_id, active = tenant.active, "activity applied");
        Ok(tenant)
    }

    /// Change reply language and currency; a live session picks them up
    /// without reconnecting.
    #[instrument(skip(self), err)]
    pub async fn update_settings(&self, client_id: &str, lang: &str, currency: &str) -> DomainResult<Tenant> {
        let mut tenant = self.require(client_id).await?;
        tenant.lang = lang.to_string();
        tenant.currency = currency.to_string();
        tenant.touch();

        self.repo.save(&tenant).await?;
        self.registry.set_session(&tenant)?;
        Ok(tenant)
    }

    /// Point an existing tenant at a new catalog URL or API key.
    ///
    /// The key is checked before anything is stored. A live session only
    /// gets the new snapshot; its remote clients are not rebuilt.
    #[instrument(skip(self, catalog_key), err)]
    pub async fn save_credentials(&self, client_id: &str, catalog_url: &str, catalog_key: &str) -> DomainResult<Tenant> {
        let mut tenant = self.require(client_id).await?;
        let catalog_url = normalize_catalog_url(catalog_url);
        if catalog_url.is_empty() || catalog_key.is_empty() {
            return Err(DomainError::ValidationFailed(
                "catalog_url and catalog_key are required".to_string(),
            ));
        }
        if catalog_url != tenant.catalog_url {
            if let Some(other) = self.repo.get_by_catalog_url(&catalog_url).await? {
                if other.client_id != tenant.client_id {
                    return Err(DomainError::TenantAlreadyExists(catalog_url));
                }
            }
        }

        tenant.catalog_url = catalog_url;
        tenant.catalog_key = catalog_key.to_string();
        let commerce = self.factory.commerce(&tenant)?;
        self.check_credentials(commerce.as_ref()).await?;
        tenant.touch();

        self.repo.save(&tenant).await?;
        self.registry.set_session(&tenant)?;

        info!(client_id, "credentials saved");
        Ok(tenant)
    }

    /// Register a new tenant.
    ///
    /// Checks the API key, registers the integration module with the
    /// commerce backend, publishes the bot commands on the gateway it
    /// issued, persists the record and starts its session when active.
    #[instrument(skip(self, tenant), fields(catalog_url = %tenant.catalog_url), err)]
    pub async fn register(&self, mut tenant: Tenant) -> DomainResult<Tenant> {
        tenant.normalize_catalog_url();
        if tenant.catalog_url.is_empty() || tenant.catalog_key.is_empty() {
            return Err(DomainError::ValidationFailed(
                "catalog_url and catalog_key are required".to_string(),
            ));
        }
        if self.repo.get_by_catalog_url(&tenant.catalog_url).await?.is_some() {
            return Err(DomainError::TenantAlreadyExists(tenant.catalog_url));
        }
        if tenant.client_id.is_empty() {
            tenant.client_id = generate_client_id();
        }

        let commerce = self.factory.commerce(&tenant)?;
        self.check_credentials(commerce.as_ref()).await?;

        let module = self.integration.module_for(&tenant.client_id);
        let registration = commerce
            .integration_module_edit(&module)
            .await
            .map_err(|e| DomainError::ActivationFailed(format!("integration module rejected: {e}")))?;
        tenant.gate_url = registration.endpoint_url;
        tenant.gate_token = registration.token;

        let gateway = self.factory.gateway(&tenant)?;
        let default_lang = self.translations.default_lang();
        for kind in CommandKind::ALL {
            let description = self.translations.localize(default_lang, kind.description_key());
            gateway
                .register_command(kind.name(), &description)
                .await
                .map_err(|e| DomainError::ActivationFailed(format!("command {} not registered: {e}", kind.name())))?;
        }
        tenant.commands = CommandKind::all_codes();

        self.repo.create(&tenant).await?;
        self.registry.set_session(&tenant)?;

        info!(client_id = %tenant.client_id, "tenant registered");
        Ok(tenant)
    }
}
