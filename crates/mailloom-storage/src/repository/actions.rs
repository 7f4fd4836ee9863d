//! Workflow action repository

use mailloom_common::types::{ActionId, ActionStatus, WorkflowId};
use sqlx::PgPool;

use crate::models::Action;

/// Workflow action repository
#[derive(Clone)]
pub struct ActionRepository {
    pool: PgPool,
}

impl ActionRepository {
    /// Create a new action repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all actions belonging to a workflow
    pub async fn list_by_workflow(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<Action>, sqlx::Error> {
        sqlx::query_as::<_, Action>(
            r#"
            SELECT * FROM actions
            WHERE workflow_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Update action status
    pub async fn set_status(&self, id: ActionId, status: ActionStatus) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE actions SET
                status = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
