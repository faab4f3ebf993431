//! Integration-module registration payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::config::BotInfoConfig;

/// API key permissions the helper relies on. `{code}` is the integration code.
const REQUIRED_CREDENTIALS: [&str; 5] = [
    "/api/integration-modules/{code}",
    "/api/integration-modules/{code}/edit",
    "/api/reference/payment-types",
    "/api/reference/delivery-types",
    "/api/store/products",
];

/// Credentials a tenant API key must hold for integration `code`.
pub fn required_credentials(code: &str) -> Vec<String> {
    REQUIRED_CREDENTIALS
        .iter()
        .map(|template| template.replace("{code}", code))
        .collect()
}

/// Entries of `required` that `granted` lacks, in `required` order.
pub fn missing_credentials(granted: &[String], required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|credential| !granted.contains(credential))
        .cloned()
        .collect()
}

/// Integration identity and the public host it is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationSettings {
    pub name: String,
    pub code: String,
    pub logo_path: String,
    pub host: String,
}

impl IntegrationSettings {
    pub fn new(bot_info: &BotInfoConfig, host: impl Into<String>) -> Self {
        Self {
            name: bot_info.name.clone(),
            code: bot_info.code.clone(),
            logo_path: bot_info.logo_path.clone(),
            host: host.into(),
        }
    }

    fn base_url(&self) -> String {
        format!("https://{}", self.host)
    }

    /// Module description announced to the commerce backend for one tenant.
    pub fn module_for(&self, client_id: &str) -> IntegrationModule {
        let base_url = self.base_url();
        IntegrationModule {
            code: self.code.clone(),
            integration_code: self.code.clone(),
            active: true,
            name: self.name.clone(),
            client_id: client_id.to_string(),
            logo: format!("{base_url}{}", self.logo_path),
            account_url: format!("{base_url}/settings/{client_id}"),
            base_url,
            actions: BTreeMap::from([("activity".to_string(), "/actions/activity".to_string())]),
            integrations: ModuleIntegrations::default(),
        }
    }
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self::new(&BotInfoConfig::default(), "localhost")
    }
}

/// Body of the integration-module edit call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationModule {
    pub code: String,
    pub integration_code: String,
    pub active: bool,
    pub name: String,
    pub client_id: String,
    pub logo: String,
    pub base_url: String,
    pub account_url: String,
    pub actions: BTreeMap<String, String>,
    pub integrations: ModuleIntegrations,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleIntegrations {
    #[serde(rename = "mgBot")]
    pub mg_bot: BTreeMap<String, String>,
}

/// Gateway endpoint and token issued for a registered module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotRegistration {
    pub endpoint_url: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings() -> IntegrationSettings {
        IntegrationSettings {
            name: "Helper".to_string(),
            code: "crm-info-bot".to_string(),
            logo_path: "/static/logo.svg".to_string(),
            host: "bot.example.com".to_string(),
        }
    }

    #[test]
    fn test_module_links_point_at_host() {
        let module = settings().module_for("abc");
        assert_eq!(module.logo, "https://bot.example.com/static/logo.svg");
        assert_eq!(module.base_url, "https://bot.example.com");
        assert_eq!(module.account_url, "https://bot.example.com/settings/abc");
        assert!(module.active);
    }

    #[test]
    fn test_module_serializes_in_wire_shape() {
        let value = serde_json::to_value(settings().module_for("abc")).unwrap();
        assert_eq!(value["integrationCode"], "crm-info-bot");
        assert_eq!(value["clientId"], "abc");
        assert_eq!(value["actions"], json!({"activity": "/actions/activity"}));
        assert_eq!(value["integrations"], json!({"mgBot": {}}));
    }

    #[test]
    fn test_required_credentials_use_integration_code() {
        let required = required_credentials("bot");
        assert_eq!(required.len(), 5);
        assert_eq!(required[0], "/api/integration-modules/bot");
        assert_eq!(required[1], "/api/integration-modules/bot/edit");
    }

    #[test]
    fn test_missing_credentials_keeps_required_order() {
        let required = required_credentials("bot");
        let granted = vec![
            "/api/store/products".to_string(),
            "/api/integration-modules/bot".to_string(),
            "/api/other".to_string(),
        ];
        assert_eq!(
            missing_credentials(&granted, &required),
            vec![
                "/api/integration-modules/bot/edit".to_string(),
                "/api/reference/payment-types".to_string(),
                "/api/reference/delivery-types".to_string(),
            ]
        );
        assert!(missing_credentials(&required, &required).is_empty());
    }
}
