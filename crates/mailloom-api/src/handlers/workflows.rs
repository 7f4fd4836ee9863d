//! Workflow run control handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mailloom_common::Error;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// Start a workflow run in the background. The run owns a fresh
/// cancellation token held in the state's run registry until it finishes.
pub async fn run_workflow(
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let token = state.register_run(workflow_id).ok_or_else(|| {
        error_response(&Error::Validation(format!(
            "Workflow {} is already running",
            workflow_id
        )))
    })?;

    info!(%workflow_id, "workflow run accepted");
    let executor = Arc::clone(&state.executor);
    let state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = executor.run(workflow_id, token).await {
            error!(%workflow_id, error = %e, "workflow run failed");
        }
        state.finish_run(workflow_id);
    });

    Ok(StatusCode::ACCEPTED)
}

/// Cancel an active workflow run. 404 when no run is registered.
pub async fn cancel_workflow(
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let token = state.take_run(workflow_id).ok_or_else(|| {
        error_response(&Error::NotFound(format!(
            "No active run for workflow {}",
            workflow_id
        )))
    })?;

    token.cancel();
    info!(%workflow_id, "workflow run cancelled");
    Ok(StatusCode::ACCEPTED)
}
