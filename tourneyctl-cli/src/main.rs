//! tourneyctl CLI - tournament administration server
//!
//! Subcommands:
//! - `serve`: run the HTTP API (matches, manager teams, players, images)
//! - `migrate`: create the database tables
//! - `config`: inspect the effective configuration

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "tourneyctl",
    author,
    version,
    about = "Tournament admin API: matches, manager teams and players with image uploads"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create database tables if they don't exist
    Migrate(commands::migrate::MigrateArgs),
    /// Show configuration (show, path)
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // dotenvy doesn't overwrite existing vars
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Migrate(args) => commands::run_migrate(args).await?,
        Commands::Config(args) => commands::run_config(args)?,
    }

    Ok(())
}
