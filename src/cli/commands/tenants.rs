//! `bot-helper tenants`: list stored tenants.

use anyhow::{Context, Result};

use crate::adapters::sqlite::{initialize_database, SqliteTenantRepository};
use crate::cli::output::{TableFormatter, TenantView};
use crate::domain::models::Config;
use crate::domain::ports::TenantRepository;

pub async fn execute(config: &Config, active_only: bool, json: bool) -> Result<()> {
    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    let repo = SqliteTenantRepository::new(pool.clone());

    let tenants = if active_only {
        repo.list_active().await
    } else {
        repo.list_all().await
    }
    .context("Failed to list tenants")?;
    pool.close().await;

    let views: Vec<TenantView> = tenants.iter().map(TenantView::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        if views.is_empty() {
            println!("No tenants found.");
            return Ok(());
        }

        println!("{}", TableFormatter::new().format_tenants(&views));
        println!(
            "\nShowing {} tenant{}",
            views.len(),
            if views.len() == 1 { "" } else { "s" }
        );
    }

    Ok(())
}
