//! HTTP client for the commerce backend REST API.
//!
//! Reference endpoints return objects keyed by code. The order of those keys
//! is the order the backend shows to its operators, so they are read with a
//! visitor that keeps source order instead of going through a map type.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    normalize_catalog_url, BotRegistration, DeliveryType, HttpClientConfig, IntegrationModule, PaymentType,
    Product, ProductFilter,
};
use crate::domain::ports::CommerceClient;

/// Path prefix of the versioned API.
pub const API_PREFIX: &str = "/api/v5";

/// Unversioned endpoint listing the API key's permissions.
const CREDENTIALS_PATH: &str = "/api/credentials";

const API_KEY_HEADER: &str = "X-API-KEY";

/// Commerce API client bound to one tenant's credentials.
#[derive(Debug, Clone)]
pub struct HttpCommerceClient {
    http: Client,
    root_url: String,
    base_url: String,
    api_key: String,
}

impl HttpCommerceClient {
    pub fn new(catalog_url: &str, api_key: impl Into<String>, config: &HttpClientConfig) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| DomainError::CommerceApi(format!("failed to build HTTP client: {e}")))?;

        let root_url = normalize_catalog_url(catalog_url);
        Ok(Self {
            http,
            base_url: format!("{root_url}{API_PREFIX}"),
            root_url,
            api_key: api_key.into(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> DomainResult<T> {
        let request = self.http.get(format!("{}{path}", self.base_url)).query(query);
        self.send("GET", path, request).await
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> DomainResult<T> {
        let request = self.http.post(format!("{}{path}", self.base_url)).form(form);
        self.send("POST", path, request).await
    }

    async fn send<T: DeserializeOwned>(&self, method: &str, path: &str, request: RequestBuilder) -> DomainResult<T> {
        let resp = request
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| DomainError::CommerceApi(format!("{method} {path} failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DomainError::CommerceApi(format!("{method} {path} body read failed: {e}")))?;
        debug!(method, path, %status, "commerce API response");

        let envelope: Envelope = serde_json::from_str(&body).unwrap_or_default();
        if !status.is_success() || envelope.success == Some(false) {
            let reason = envelope
                .error_msg
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| format!("status {status}"));
            return Err(DomainError::CommerceApi(reason));
        }

        serde_json::from_str(&body)
            .map_err(|e| DomainError::CommerceApi(format!("{method} {path} parse failed: {e}")))
    }
}

#[async_trait]
impl CommerceClient for HttpCommerceClient {
    async fn payment_types(&self) -> DomainResult<Vec<PaymentType>> {
        let resp: PaymentTypesResponse = self.get("/reference/payment-types", &[]).await?;
        Ok(resp.payment_types.0)
    }

    async fn delivery_types(&self) -> DomainResult<Vec<DeliveryType>> {
        let resp: DeliveryTypesResponse = self.get("/reference/delivery-types", &[]).await?;
        Ok(resp.delivery_types.0)
    }

    async fn products(&self, filter: &ProductFilter) -> DomainResult<Vec<Product>> {
        let resp: ProductsResponse = self
            .get("/store/products", &[("filter[name]", filter.name.as_str())])
            .await?;
        Ok(resp.products)
    }

    async fn credentials(&self) -> DomainResult<Vec<String>> {
        let request = self.http.get(format!("{}{CREDENTIALS_PATH}", self.root_url));
        let resp: CredentialsResponse = self.send("GET", CREDENTIALS_PATH, request).await?;
        Ok(resp.credentials)
    }

    async fn integration_module_edit(&self, module: &IntegrationModule) -> DomainResult<BotRegistration> {
        let payload = serde_json::to_string(module)?;
        let path = format!("/integration-modules/{}/edit", module.code);
        let resp: IntegrationEditResponse = self
            .post_form(&path, &[("integrationModule", payload.as_str())])
            .await?;
        Ok(resp.info.mg_bot)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error_msg: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentTypesResponse {
    #[serde(default)]
    payment_types: OrderedValues<PaymentType>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryTypesResponse {
    #[serde(default)]
    delivery_types: OrderedValues<DeliveryType>,
}

#[derive(Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct CredentialsResponse {
    #[serde(default)]
    credentials: Vec<String>,
}

#[derive(Deserialize)]
struct IntegrationEditResponse {
    info: IntegrationInfo,
}

#[derive(Deserialize)]
struct IntegrationInfo {
    #[serde(rename = "mgBot")]
    mg_bot: BotRegistration,
}

/// Values of a JSON object in document order. An empty array is accepted
/// too, which is what the backend sends when nothing is configured.
struct OrderedValues<T>(Vec<T>);

impl<T> Default for OrderedValues<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedValues<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValuesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for ValuesVisitor<T> {
            type Value = OrderedValues<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by code")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((_code, value)) = map.next_entry::<de::IgnoredAny, T>()? {
                    values.push(value);
                }
                Ok(OrderedValues(values))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element()? {
                    values.push(value);
                }
                Ok(OrderedValues(values))
            }
        }

        deserializer.deserialize_any(ValuesVisitor(PhantomData))
    }
}
