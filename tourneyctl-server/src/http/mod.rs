//! HTTP server layer
//!
//! Axum server with:
//! - Permissive CORS
//! - Request tracing
//! - Graceful shutdown
//! - JSON error responses

pub mod server;
pub mod error;
pub mod extractors;
pub mod form;
pub mod routes;

pub use server::{build_router, run_server, AppState, ServerError};
pub use error::ApiError;
