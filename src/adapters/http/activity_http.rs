//! Tenant webhook HTTP server.
//!
//! Receives activity and settings changes from the commerce backend and
//! forwards them to the tenant service. No HTML, no admin sessions.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::domain::errors::DomainError;
use crate::domain::models::{Activity, Tenant};
use crate::services::tenant_service::TenantService;

/// Shared state of the webhook handlers.
pub struct HttpState {
    pub tenants: Arc<TenantService>,
    pub version: String,
}

pub struct ActivityHttpServer {
    state: Arc<HttpState>,
}

impl ActivityHttpServer {
    pub fn new(tenants: Arc<TenantService>, version: impl Into<String>) -> Self {
        Self {
            state: Arc::new(HttpState {
                tenants,
                version: version.into(),
            }),
        }
    }

    /// Build the router with all endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/actions/activity", post(activity))
            .route("/api/settings", post(settings))
            .route("/api/connections", post(create_connection))
            .route("/api/save", post(save_credentials))
            .route("/health", get(health))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: Option<SocketAddr> = listener.local_addr().ok();
        tracing::info!(?addr, "webhook HTTP server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

#[derive(Debug, Deserialize)]
struct ActivityForm {
    #[serde(rename = "clientId", default)]
    client_id: String,
    #[serde(default)]
    activity: String,
    #[serde(rename = "systemUrl", default)]
    system_url: String,
}

#[derive(Debug, Deserialize)]
struct SettingsRequest {
    client_id: String,
    lang: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct ConnectionRequest {
    catalog_url: String,
    catalog_key: String,
    #[serde(default)]
    lang: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    client_id: String,
    catalog_url: String,
    catalog_key: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: String,
    sessions: usize,
}

fn wrong_data() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": "Wrong data"})),
    )
        .into_response()
}

fn localized(state: &HttpState, key: &str) -> String {
    let translations = state.tenants.translations();
    translations.localize(translations.default_lang(), key)
}

async fn activity(State(state): State<Arc<HttpState>>, Form(form): Form<ActivityForm>) -> Response {
    let Ok(activity) = serde_json::from_str::<Activity>(&form.activity) else {
        return wrong_data();
    };

    let system_url = Some(form.system_url.as_str());
    match state.tenants.apply_activity(&form.client_id, activity, system_url).await {
        Ok(_) => Json(json!({"success": true})).into_response(),
        Err(DomainError::TenantNotFound(_)) => wrong_data(),
        Err(e) => {
            tracing::error!(client_id = %form.client_id, error = %e, "activity update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": e.to_string()})),
            )
                .into_response()
        }
    }
}

async fn settings(State(state): State<Arc<HttpState>>, Json(req): Json<SettingsRequest>) -> Response {
    match state
        .tenants
        .update_settings(&req.client_id, &req.lang, &req.currency)
        .await
    {
        Ok(_) => Json(json!({"msg": localized(&state, "successful")})).into_response(),
        Err(DomainError::TenantNotFound(_)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": localized(&state, "wrong_data")})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(client_id = %req.client_id, error = %e, "settings update failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response()
        }
    }
}

/// Response for a failed registration or credential change.
fn setup_error(state: &HttpState, error: DomainError) -> Response {
    let bad_request = |key: &str| {
        (StatusCode::BAD_REQUEST, Json(json!({"error": localized(state, key)}))).into_response()
    };
    match error {
        DomainError::TenantAlreadyExists(_) => bad_request("connection_already_created"),
        DomainError::TenantNotFound(_) | DomainError::ValidationFailed(_) => bad_request("wrong_data"),
        DomainError::MissingCredentials(missing) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": localized(state, "missing_credentials"), "missing": missing})),
        )
            .into_response(),
        DomainError::CommerceApi(e) => {
            tracing::warn!(error = %e, "commerce backend rejected the API key");
            bad_request("incorrect_url_key")
        }
        DomainError::ActivationFailed(e) => {
            tracing::warn!(error = %e, "integration activation failed");
            bad_request("error_activity_mg")
        }
        e => {
            tracing::error!(error = %e, "tenant setup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response()
        }
    }
}

async fn create_connection(State(state): State<Arc<HttpState>>, Json(req): Json<ConnectionRequest>) -> Response {
    let tenant = Tenant::new("", &req.catalog_url, req.catalog_key)
        .with_active(true)
        .with_lang(req.lang.unwrap_or_else(|| state.tenants.translations().default_lang().to_string()))
        .with_currency(req.currency.unwrap_or_default());

    match state.tenants.register(tenant).await {
        Ok(tenant) => (
            StatusCode::CREATED,
            Json(json!({
                "client_id": tenant.client_id,
                "url": format!("/settings/{}", tenant.client_id),
                "message": localized(&state, "successful"),
            })),
        )
            .into_response(),
        Err(e) => setup_error(&state, e),
    }
}

async fn save_credentials(State(state): State<Arc<HttpState>>, Json(req): Json<CredentialsRequest>) -> Response {
    match state
        .tenants
        .save_credentials(&req.client_id, &req.catalog_url, &req.catalog_key)
        .await
    {
        Ok(_) => Json(json!({"msg": localized(&state, "successful")})).into_response(),
        Err(e) => setup_error(&state, e),
    }
}

async fn health(State(state): State<Arc<HttpState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: state.version.clone(),
        sessions: state.tenants.registry().len(),
    })
}
