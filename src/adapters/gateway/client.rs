//! HTTP client for the messaging gateway bot API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{HttpClientConfig, OutboundMessage, SocketParams};
use crate::domain::ports::GatewayClient;

/// Path prefix of the bot API.
pub const API_PREFIX: &str = "/api/bot/v1";

/// Header carrying the bot token on every request and on the socket handshake.
pub const TOKEN_HEADER: &str = "X-Bot-Token";

#[derive(Debug, Clone)]
pub struct HttpGatewayClient {
    http: Client,
    gate_url: String,
    token: String,
}

#[derive(Serialize)]
struct CommandRequest<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

impl HttpGatewayClient {
    pub fn new(gate_url: &str, token: impl Into<String>, config: &HttpClientConfig) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| DomainError::GatewayApi(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            gate_url: gate_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn call<B: Serialize + Sync>(&self, method: Method, path: &str, body: &B) -> DomainResult<()> {
        let url = format!("{}{API_PREFIX}{path}", self.gate_url);
        let resp = self
            .http
            .request(method.clone(), &url)
            .header(TOKEN_HEADER, &self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::GatewayApi(format!("{method} {path} failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_default();
        let errors = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.errors)
            .unwrap_or_default();
        let reason = if errors.is_empty() {
            format!("{method} {path} returned {status}")
        } else {
            errors.join("; ")
        };
        Err(DomainError::GatewayApi(reason))
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn describe_socket(&self, events: &[&str]) -> DomainResult<SocketParams> {
        let mut url = Url::parse(&format!("{}{API_PREFIX}/ws", self.gate_url))
            .map_err(|e| DomainError::GatewayApi(format!("invalid gateway URL '{}': {e}", self.gate_url)))?;

        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(DomainError::GatewayApi(format!(
                    "unsupported gateway URL scheme '{other}'"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| DomainError::GatewayApi(format!("cannot switch '{}' to {scheme}", self.gate_url)))?;
        url.query_pairs_mut().append_pair("events", &events.join(","));

        Ok(SocketParams {
            url: url.to_string(),
            headers: vec![(TOKEN_HEADER.to_string(), self.token.clone())],
        })
    }

    async fn send_message(&self, message: &OutboundMessage) -> DomainResult<()> {
        self.call(Method::POST, "/messages", message).await
    }

    async fn register_command(&self, name: &str, description: &str) -> DomainResult<()> {
        let body = CommandRequest { name, description };
        self.call(Method::PUT, &format!("/my/commands/{name}"), &body).await
    }
}
