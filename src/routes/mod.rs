use axum::{
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::DiscoverySettings,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::sources::MovieSource,
};

pub mod debug;
pub mod recommendations;
pub mod shuffle;

/// Shared state handed to every handler
pub struct AppState {
    pub source: Arc<dyn MovieSource>,
    pub settings: DiscoverySettings,
}

impl AppState {
    pub fn new(source: Arc<dyn MovieSource>, settings: DiscoverySettings) -> Self {
        Self { source, settings }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", get(recommendations::recommend))
        .route("/shuffle", get(shuffle::shuffle))
        .route("/debug", get(debug::report))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
