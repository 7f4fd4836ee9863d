//! Workflow repository

use mailloom_common::types::{WorkflowId, WorkflowStatus};
use sqlx::PgPool;

use crate::models::Workflow;

/// Workflow repository
#[derive(Clone)]
pub struct WorkflowRepository {
    pool: PgPool,
}

impl WorkflowRepository {
    /// Create a new workflow repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a workflow by ID
    pub async fn get(&self, id: WorkflowId) -> Result<Option<Workflow>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>("SELECT * FROM workflows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Update workflow status
    pub async fn set_status(
        &self,
        id: WorkflowId,
        status: WorkflowStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE workflows SET
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
