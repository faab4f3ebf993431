//! Alert sinks: where error-severity session events end up besides the log.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AlertingConfig;
use crate::domain::ports::AlertSink;

/// Writes alerts to the tracing log. Used when no webhook is configured.
#[derive(Debug, Clone, Default)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn capture(&self, error: &str, tags: &BTreeMap<String, String>) {
        tracing::error!(target: "bot_helper::alert", ?tags, "{error}");
    }
}

#[derive(Serialize)]
struct AlertPayload<'a> {
    error: &'a str,
    tags: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<&'a str>,
    timestamp: String,
}

/// Posts alerts as JSON to an error-tracking webhook.
#[derive(Debug, Clone)]
pub struct WebhookAlertSink {
    http: reqwest::Client,
    url: String,
    environment: Option<String>,
}

impl WebhookAlertSink {
    pub fn new(url: impl Into<String>, environment: Option<String>) -> DomainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| DomainError::Configuration(format!("failed to build alert client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            environment,
        })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn capture(&self, error: &str, tags: &BTreeMap<String, String>) {
        let payload = AlertPayload {
            error,
            tags,
            environment: self.environment.as_deref(),
            timestamp: Utc::now().to_rfc3339(),
        };

        match self.http.post(&self.url).json(&payload).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(status = %resp.status(), "alert webhook rejected event");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "alert webhook unreachable"),
        }
    }
}

/// Pick the sink described by the alerting section.
pub fn build_alert_sink(config: &AlertingConfig) -> DomainResult<Arc<dyn AlertSink>> {
    let sink: Arc<dyn AlertSink> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookAlertSink::new(url, config.environment.clone())?),
        None => Arc::new(TracingAlertSink),
    };
    Ok(sink)
}
