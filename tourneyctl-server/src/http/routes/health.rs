//! Health check endpoint
//!
//! Reports the crate version and which storage backend the server is
//! running on, so a `serve --memory` instance is easy to tell apart.

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// `postgres` or `memory`
    pub storage: &'static str,
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.store.backend(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TourneyConfig;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn health_reports_storage_backend() {
        let state = AppState::new(Arc::new(MemoryStore::new()), &TourneyConfig::default());
        let Json(body) = health(State(Arc::new(state))).await;
        assert_eq!(body.status, "ok");
        assert!(!body.version.is_empty());
        assert_eq!(body.storage, "memory");
    }
}
