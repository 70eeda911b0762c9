// Tabnotes API Library
// Decision: Router assembly lives in the library so integration tests drive the same stack as the binary

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use tabnotes_core::SessionManager;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Authentication module
pub mod auth;

pub mod config;
pub mod openapi;
pub mod state;

pub use config::{AuthConfig, ServerConfig};
pub use state::{AppState, AppStateBuilder};

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Build the full HTTP router with its middleware stack
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let app = Router::new()
        .merge(api::health::routes(state.clone()))
        .merge(auth::routes(state.clone()))
        .merge(api::sessions::routes(state))
        .route("/api-doc/openapi.json", get(openapi_json))
        .layer(RequestBodyLimitLayer::new(config.max_body_size));

    let cors_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
                .allow_credentials(true),
        )
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}

/// Periodically delete sessions whose window has ended
pub fn spawn_purge_task(sessions: Arc<SessionManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = sessions.purge_expired_sessions().await {
                tracing::error!(error = %e, "failed to purge expired sessions");
            }
        }
    })
}
