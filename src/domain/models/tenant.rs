//! Tenant domain model.
//!
//! A tenant links one commerce backend (catalog URL + key) to the messaging
//! gateway (gateway URL + bot token). The registry keys live sessions by
//! [`Tenant::client_id`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Strip every trailing `/` from a catalog URL.
///
/// Applying it twice yields the same value as applying it once.
pub fn normalize_catalog_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Generate a fresh opaque client identifier.
pub fn generate_client_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// One configured customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub client_id: String,
    pub catalog_url: String,
    pub catalog_key: String,
    pub gate_url: String,
    pub gate_token: String,
    pub active: bool,
    pub lang: String,
    pub currency: String,
    /// Enabled command codes as registered on the gateway.
    ///
    /// Stored for compatibility only; dispatch is not gated on it.
    pub commands: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create an inactive tenant with normalized catalog credentials.
    pub fn new(
        client_id: impl Into<String>,
        catalog_url: impl AsRef<str>,
        catalog_key: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            client_id: client_id.into(),
            catalog_url: normalize_catalog_url(catalog_url.as_ref()),
            catalog_key: catalog_key.into(),
            gate_url: String::new(),
            gate_token: String::new(),
            active: false,
            lang: String::new(),
            currency: String::new(),
            commands: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_gateway(mut self, gate_url: impl Into<String>, gate_token: impl Into<String>) -> Self {
        self.gate_url = gate_url.into();
        self.gate_token = gate_token.into();
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Normalize the catalog URL in place.
    pub fn normalize_catalog_url(&mut self) {
        self.catalog_url = normalize_catalog_url(&self.catalog_url);
    }

    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Activity flags reported by the commerce backend for an integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub freeze: bool,
}

impl Activity {
    /// Whether a session should run: active and not frozen.
    pub fn is_effective(self) -> bool {
        self.active && !self.freeze
    }
}
