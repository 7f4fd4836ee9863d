//! Campaign repository

use mailloom_common::types::CampaignId;
use sqlx::PgPool;

use crate::models::Campaign;

/// Campaign repository
#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    /// Create a new campaign repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically claim all campaigns that are due for delivery.
    ///
    /// The conditional update flips pending rows to `sending` and stamps
    /// `run_at` in one statement, so two overlapping scheduler ticks can
    /// never both claim the same campaign.
    pub async fn claim_due(&self) -> Result<Vec<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns SET
                status = 'sending',
                run_at = NOW(),
                updated_at = NOW()
            WHERE status = 'pending'
              AND delivery_at < NOW()
            RETURNING *
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Mark a campaign as sent
    pub async fn mark_sent(&self, id: CampaignId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                status = 'sent',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
