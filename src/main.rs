//! Bot Helper CLI entry point.

use anyhow::Result;
use clap::Parser;

use bot_helper::cli::{Cli, Commands};
use bot_helper::infrastructure::config::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = dispatch(cli).await {
        bot_helper::cli::handle_error(err, json);
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = ConfigLoader::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => bot_helper::cli::commands::run::execute(config).await,
        Commands::Migrate => bot_helper::cli::commands::migrate::execute(&config, cli.json).await,
        Commands::Tenants { active } => {
            bot_helper::cli::commands::tenants::execute(&config, active, cli.json).await
        }
    }
}
