//! Contact repository

use mailloom_common::types::MailingListId;
use sqlx::PgPool;

use crate::models::Contact;

/// Contact repository
#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    /// Create a new contact repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all contacts subscribed to a mailing list
    pub async fn list_by_mailing_list(
        &self,
        mailing_list_id: MailingListId,
    ) -> Result<Vec<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT c.* FROM contacts c
            JOIN mailing_list_contacts mlc ON mlc.contact_id = c.id
            WHERE mlc.mailing_list_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(mailing_list_id)
        .fetch_all(&self.pool)
        .await
    }
}
