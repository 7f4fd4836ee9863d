//! Outbound mail server repository

use mailloom_common::types::CompanyId;
use sqlx::PgPool;

use crate::models::MailServer;

/// Outbound mail server repository
#[derive(Clone)]
pub struct ServerRepository {
    pool: PgPool,
}

impl ServerRepository {
    /// Create a new server repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all outbound servers configured for a company
    pub async fn list_by_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<MailServer>, sqlx::Error> {
        sqlx::query_as::<_, MailServer>(
            r#"
            SELECT * FROM servers
            WHERE company_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
    }
}
