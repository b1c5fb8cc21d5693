//! Axum server setup
//!
//! Server skeleton with:
//! - Permissive CORS (`*`) for the admin front-end
//! - Tracing middleware
//! - Request body limit
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Uri};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::routes;
use crate::config::{TourneyConfig, UploadLimits};
use crate::db::Store;
use crate::models::{ManagerTeam, Match, Player};
use crate::uploads::ImageStore;

/// Path prefix stored images are served under
pub const UPLOADS_ROUTE: &str = "/api/uploads";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub images: ImageStore,
    pub limits: UploadLimits,
    /// Largest request body accepted, in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &TourneyConfig) -> Self {
        Self {
            store,
            images: ImageStore::new(
                config.uploads.dir.clone(),
                config.uploads.public_base_url.clone(),
            ),
            limits: config.uploads.limits,
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ]);

    let uploads = ServeDir::new(state.images.dir());
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::entity::router::<Match>("/matches"))
        .merge(routes::entity::router::<ManagerTeam>("/addteam"))
        .merge(routes::entity::router::<Player>("/addplayer"))
        .nest_service(UPLOADS_ROUTE, uploads)
        .fallback(no_route)
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn no_route(uri: Uri) -> ApiError {
    ApiError::NoRoute {
        path: uri.path().to_string(),
    }
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&config.database.url).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), &config);
/// run_server(state, config.server.bind).await?;
/// ```
pub async fn run_server(state: AppState, bind: SocketAddr) -> Result<(), ServerError> {
    tracing::info!(
        uploads = %state.images.dir().display(),
        max_body_bytes = state.max_body_bytes,
        "upload storage configured"
    );
    let app = build_router(state);

    // Bind listener
    let listener = TcpListener::bind(bind).await?;
    tracing::info!("Server listening on {}", bind);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
