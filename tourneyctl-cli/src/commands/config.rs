//! Configuration inspection

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tourneyctl_server::TourneyConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (file + environment) as TOML
    Show(ShowArgs),
    /// Show default config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Config file (default: ~/.tourneyctl/config.toml when present)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show(args) => run_show(args),
        ConfigCommands::Path => run_path(),
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let text = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    print!("{}", text);
    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", TourneyConfig::default_path().display());
    Ok(())
}
