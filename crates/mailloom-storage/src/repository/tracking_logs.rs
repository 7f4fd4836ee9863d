//! Tracking log repository

use mailloom_common::types::{CampaignId, TrackingLogId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateTrackingLog, TrackingLog};

/// Tracking log repository
#[derive(Clone)]
pub struct TrackingLogRepository {
    pool: PgPool,
}

impl TrackingLogRepository {
    /// Create a new tracking log repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a tracking log row for a tracked send
    pub async fn create(&self, input: CreateTrackingLog) -> Result<TrackingLog, sqlx::Error> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, TrackingLog>(
            r#"
            INSERT INTO tracking_logs (
                id, company_id, campaign_id, action_id, recipient_email,
                status, open_tracking_id, click_tracking_id
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.company_id)
        .bind(input.campaign_id)
        .bind(input.action_id)
        .bind(&input.recipient_email)
        .bind(input.open_tracking_id)
        .bind(input.click_tracking_id)
        .fetch_one(&self.pool)
        .await
    }

    /// List all tracking rows for a campaign
    pub async fn list_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<TrackingLog>, sqlx::Error> {
        sqlx::query_as::<_, TrackingLog>(
            "SELECT * FROM tracking_logs WHERE campaign_id = $1 ORDER BY created_at ASC",
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Find a row by its opaque open tracking identifier
    pub async fn find_by_open_tracking_id(
        &self,
        tracking_id: Uuid,
    ) -> Result<Option<TrackingLog>, sqlx::Error> {
        sqlx::query_as::<_, TrackingLog>(
            "SELECT * FROM tracking_logs WHERE open_tracking_id = $1",
        )
        .bind(tracking_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a row by its opaque click tracking identifier
    pub async fn find_by_click_tracking_id(
        &self,
        tracking_id: Uuid,
    ) -> Result<Option<TrackingLog>, sqlx::Error> {
        sqlx::query_as::<_, TrackingLog>(
            "SELECT * FROM tracking_logs WHERE click_tracking_id = $1",
        )
        .bind(tracking_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Record an open: set status and the first-open timestamp
    pub async fn mark_opened(&self, id: TrackingLogId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE tracking_logs SET
                status = 'opened',
                opened_at = COALESCE(opened_at, NOW()),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a click: set status, timestamp, and bump the click counter
    pub async fn mark_clicked(&self, id: TrackingLogId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE tracking_logs SET
                status = 'clicked',
                clicked_at = NOW(),
                click_count = click_count + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a per-recipient send failure on the tracking row
    pub async fn record_error(&self, id: TrackingLogId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE tracking_logs SET
                error = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
