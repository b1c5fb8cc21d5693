//! HTTP server command
//!
//! Runs the tourneyctl API with Postgres storage (or in memory with
//! `--memory`), serving uploaded images from the uploads directory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use tourneyctl_server::db::{create_pool_with_options, migrations, Store};
use tourneyctl_server::http::{run_server, AppState};
use tourneyctl_server::{MemoryStore, PgStore, TourneyConfig};

/// Arguments for the serve command
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Config file (default: ~/.tourneyctl/config.toml when present)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Address to bind to (overrides config/environment)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Directory uploaded images are written to
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Prefix for image URLs in responses (e.g. https://cdn.example.com/img/)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Skip creating tables on startup
    #[arg(long)]
    pub no_migrate: bool,

    /// Keep data in memory instead of Postgres (lost on exit)
    #[arg(long, conflicts_with_all = ["database_url", "no_migrate"])]
    pub memory: bool,
}

impl ServeArgs {
    /// Apply command-line overrides on top of file and environment values.
    pub fn apply_overrides(&self, config: &mut TourneyConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(dir) = &self.upload_dir {
            config.uploads.dir = dir.clone();
        }
        if let Some(base) = &self.base_url {
            config.uploads.public_base_url = base.clone();
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    let store: Arc<dyn Store> = if args.memory {
        tracing::warn!("Using in-memory storage; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool_with_options(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to create database pool")?;

        if !args.no_migrate {
            migrations::run(&pool)
                .await
                .context("Failed to run migrations")?;
        }

        Arc::new(PgStore::new(pool))
    };

    tracing::info!("Starting tourneyctl server on {}", config.server.bind);

    let state = AppState::new(store, &config);

    // Run server (blocks until shutdown)
    run_server(state, config.server.bind)
        .await
        .context("Server error")?;

    Ok(())
}
