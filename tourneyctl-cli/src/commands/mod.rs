//! Command implementations for tourneyctl CLI

use std::path::Path;

use anyhow::{Context, Result};
use tourneyctl_server::TourneyConfig;

pub mod config;
pub mod migrate;
pub mod serve;

pub use config::run_config;
pub use migrate::run_migrate;
pub use serve::run_serve;

/// Config file (explicit path or the default location) with environment
/// overrides applied. Command-line flags are applied by each command.
pub fn load_config(path: Option<&Path>) -> Result<TourneyConfig> {
    let mut config = TourneyConfig::load(path).context("Failed to load configuration")?;
    config
        .apply_env()
        .context("Invalid configuration in environment")?;
    Ok(config)
}
