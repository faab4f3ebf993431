//! `bot-helper migrate`: bring the tenant store schema up to date.

use anyhow::{Context, Result};

use crate::adapters::sqlite::{initialize_database, Migrator};
use crate::domain::models::Config;

pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    let version = Migrator::new(pool.clone())
        .get_current_version()
        .await
        .context("Failed to read schema version")?;
    pool.close().await;

    if json {
        let output = serde_json::json!({
            "database": config.database.path,
            "schema_version": version,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Database {} is at schema version {}", config.database.path, version);
    }

    Ok(())
}
