//! tourneyctl-server: tournament administration over HTTP
//!
//! CRUD for matches, manager teams and players, each with an optional
//! uploaded image, backed by Postgres and a local uploads directory.

pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod uploads;

pub use config::{ConfigError, TourneyConfig};
pub use db::{create_pool, MemoryStore, PgStore};
pub use http::{build_router, run_server, AppState, ServerError};
