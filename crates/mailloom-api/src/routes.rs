//! API routes

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, tracking, workflows};
use crate::state::AppState;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Health check routes
    let health_routes = Router::new()
        .route("/", get(health::health))
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness))
        .with_state(state.clone());

    // Engagement callback routes, reachable from mail clients
    let track_routes = Router::new()
        .route("/open/:tracking_id", get(tracking::track_open))
        .route("/click/:tracking_id", get(tracking::track_click))
        .with_state(state.clone());

    // Workflow run control
    let workflow_routes = Router::new()
        .route("/:workflow_id/run", post(workflows::run_workflow))
        .route("/:workflow_id/cancel", post(workflows::cancel_workflow))
        .with_state(state.clone());

    Router::new()
        .nest("/health", health_routes)
        .nest("/track", track_routes)
        .nest("/api/v1/workflows", workflow_routes)
        .layer(TraceLayer::new_for_http())
}
