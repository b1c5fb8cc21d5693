//! Schema migration command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tourneyctl_server::db::{create_pool_with_options, migrations};
use tourneyctl_server::TourneyConfig;

#[derive(Parser, Debug, Default)]
pub struct MigrateArgs {
    /// Config file (default: ~/.tourneyctl/config.toml when present)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

impl MigrateArgs {
    pub fn apply_overrides(&self, config: &mut TourneyConfig) {
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
    }
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    let pool = create_pool_with_options(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    println!("Tables ready: matches, manageteam, players");
    Ok(())
}
