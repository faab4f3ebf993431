//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bot-helper")]
#[command(about = "Bot Helper - catalog answers for messaging gateway tenants", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to config.yml)
    #[arg(short, long, global = true, env = "BOT_HELPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start sessions for active tenants and serve the webhook endpoints
    Run,

    /// Apply pending database migrations
    Migrate,

    /// List stored tenants
    Tenants {
        /// Only show active tenants
        #[arg(short, long)]
        active: bool,
    },
}
