//! Server configuration - file, environment and defaults
//!
//! Precedence (highest first): CLI flags (applied by the caller),
//! environment variables, `~/.tourneyctl/config.toml`, built-in defaults.
//!
//! Environment variables:
//! - `DATABASE_URL`: Postgres connection string
//! - `TOURNEY_BIND`: listen address (e.g. `0.0.0.0:3030`)
//! - `TOURNEY_UPLOAD_DIR`: directory uploaded images are written to
//! - `TOURNEY_BASE_URL`: prefix clients see in front of image file names

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

/// Complete configuration for the tourneyctl server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourneyConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub uploads: UploadsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to (default: 127.0.0.1:3030)
    pub bind: SocketAddr,
    /// Largest request body accepted, in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3030)),
            max_body_bytes: 8 * MIB as usize,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/tourney".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsSection {
    /// Directory images are written to
    pub dir: PathBuf,
    /// Prefix prepended to stored file names in responses
    pub public_base_url: String,
    #[serde(flatten)]
    pub limits: UploadLimits,
}

impl Default for UploadsSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            public_base_url: "/api/uploads/".to_string(),
            limits: UploadLimits::default(),
        }
    }
}

/// Maximum image size per entity, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    pub match_max_bytes: u64,
    pub team_max_bytes: u64,
    pub player_max_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            match_max_bytes: 2 * MIB,
            team_max_bytes: 2 * MIB,
            player_max_bytes: 5 * MIB,
        }
    }
}

impl TourneyConfig {
    /// Get default config file path: ~/.tourneyctl/config.toml
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tourneyctl/config.toml")
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default path is
    /// read when present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment variable overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|var| std::env::var(var).ok())
    }

    fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }

        if let Some(value) = lookup("TOURNEY_BIND") {
            self.server.bind = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "TOURNEY_BIND",
                value,
            })?;
        }

        if let Some(dir) = lookup("TOURNEY_UPLOAD_DIR") {
            self.uploads.dir = PathBuf::from(dir);
        }

        if let Some(base) = lookup("TOURNEY_BASE_URL") {
            self.uploads.public_base_url = base;
        }

        Ok(())
    }
}
