//! Application state shared across handlers

use mailloom_common::types::WorkflowId;
use mailloom_core::{TrackingStore, WorkflowExecutor};
use mailloom_storage::DatabasePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Shared application state
pub struct AppState {
    pub db_pool: DatabasePool,
    pub tracking: Arc<dyn TrackingStore>,
    pub executor: Arc<WorkflowExecutor>,
    runs: Mutex<HashMap<WorkflowId, CancellationToken>>,
}

impl AppState {
    pub fn new(
        db_pool: DatabasePool,
        tracking: Arc<dyn TrackingStore>,
        executor: Arc<WorkflowExecutor>,
    ) -> Self {
        Self {
            db_pool,
            tracking,
            executor,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new run for the workflow. Returns the token to pass to
    /// the executor, or `None` when a run is already active.
    pub fn register_run(&self, workflow_id: WorkflowId) -> Option<CancellationToken> {
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        if runs.contains_key(&workflow_id) {
            return None;
        }
        let token = CancellationToken::new();
        runs.insert(workflow_id, token.clone());
        Some(token)
    }

    /// Remove the run entry once the executor finishes.
    pub fn finish_run(&self, workflow_id: WorkflowId) {
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        runs.remove(&workflow_id);
    }

    /// Take the active run's token, if any.
    pub fn take_run(&self, workflow_id: WorkflowId) -> Option<CancellationToken> {
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        runs.remove(&workflow_id)
    }
}
