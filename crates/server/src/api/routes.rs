use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{download, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and status
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        // Batches
        .route(
            "/download",
            post(download::download).fallback(handlers::method_not_allowed),
        );

    Router::new()
        .route(
            "/",
            post(download::download).fallback(handlers::method_not_allowed),
        )
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
