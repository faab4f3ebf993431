//! SQLite implementation of the TenantRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{normalize_catalog_url, Tenant};
use crate::domain::ports::TenantRepository;

use super::{parse_datetime, parse_json_or_default};

pub struct SqliteTenantRepository {
    pool: SqlitePool,
}

impl SqliteTenantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for SqliteTenantRepository {
    async fn create(&self, tenant: &Tenant) -> DomainResult<()> {
        let commands = serde_json::to_string(&tenant.commands)?;
        sqlx::query(
            r#"INSERT INTO tenants (client_id, catalog_url, catalog_key, gate_url, gate_token, active, lang, currency, commands, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(&tenant.client_id)
        .bind(normalize_catalog_url(&tenant.catalog_url))
        .bind(&tenant.catalog_key)
        .bind(&tenant.gate_url)
        .bind(&tenant.gate_token)
        .bind(tenant.active)
        .bind(&tenant.lang)
        .bind(&tenant.currency)
        .bind(commands)
        .bind(tenant.created_at.to_rfc3339())
        .bind(tenant.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_client_id(&self, client_id: &str) -> DomainResult<Option<Tenant>> {
        let row: Option<TenantRow> = sqlx::query_as(
            "SELECT * FROM tenants WHERE client_id = ?"
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_catalog_url(&self, catalog_url: &str) -> DomainResult<Option<Tenant>> {
        let row: Option<TenantRow> = sqlx::query_as(
            "SELECT * FROM tenants WHERE catalog_url = ?"
        )
        .bind(normalize_catalog_url(catalog_url))
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_active(&self) -> DomainResult<Vec<Tenant>> {
        let rows: Vec<TenantRow> = sqlx::query_as(
            "SELECT * FROM tenants WHERE active = 1 ORDER BY id"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_all(&self) -> DomainResult<Vec<Tenant>> {
        let rows: Vec<TenantRow> = sqlx::query_as("SELECT * FROM tenants ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn save(&self, tenant: &Tenant) -> DomainResult<()> {
        let commands = serde_json::to_string(&tenant.commands)?;
        let result = sqlx::query(
            r#"UPDATE tenants SET catalog_url = ?, catalog_key = ?, gate_url = ?, gate_token = ?, active = ?,
                   lang = ?, currency = ?, commands = ?, updated_at = ?
               WHERE client_id = ?"#
        )
        .bind(normalize_catalog_url(&tenant.catalog_url))
        .bind(&tenant.catalog_key)
        .bind(&tenant.gate_url)
        .bind(&tenant.gate_token)
        .bind(tenant.active)
        .bind(&tenant.lang)
        .bind(&tenant.currency)
        .bind(commands)
        .bind(tenant.updated_at.to_rfc3339())
        .bind(&tenant.client_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TenantNotFound(tenant.client_id.clone()));
        }

        Ok(())
    }

    async fn set_activity(&self, client_id: &str, active: bool, catalog_url: &str) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE tenants SET active = ?, catalog_url = ?, updated_at = ? WHERE client_id = ?"
        )
        .bind(active)
        .bind(normalize_catalog_url(catalog_url))
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(client_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TenantNotFound(client_id.to_string()));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TenantRow {
    #[allow(dead_code)]
    id: i64,
    client_id: String,
    catalog_url: String,
    catalog_key: String,
    gate_url: String,
    gate_token: String,
    active: bool,
    lang: String,
    currency: String,
    commands: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = DomainError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Ok(Tenant {
            client_id: row.client_id,
            catalog_url: row.catalog_url,
            catalog_key: row.catalog_key,
            gate_url: row.gate_url,
            gate_token: row.gate_token,
            active: row.active,
            lang: row.lang,
            currency: row.currency,
            commands: parse_json_or_default(row.commands)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
