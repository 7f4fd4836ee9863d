//! Database models

use chrono::{DateTime, Utc};
use mailloom_common::types::{
    ActionId, CampaignId, CompanyId, ContactId, MailingListId, ServerId, TrackingLogId, WorkflowId,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Workflow model: a tree of actions tied to a mailing list
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub company_id: CompanyId,
    pub mailing_list_id: MailingListId,
    pub name: String,
    pub status: String,
    pub current_step: i32,
    pub trigger: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Workflow action model. `data` is an opaque JSON payload keyed by `kind`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub workflow_id: WorkflowId,
    pub parent_id: Option<ActionId>,
    pub name: String,
    pub kind: String,
    pub status: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campaign model: a one-shot scheduled email blast
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub company_id: CompanyId,
    pub mailing_list_id: MailingListId,
    pub name: String,
    pub subject: String,
    pub html_body: String,
    pub plain_body: Option<String>,
    pub from_address: String,
    pub from_name: Option<String>,
    pub reply_to: Option<String>,
    pub status: String,
    pub track_open: bool,
    pub track_click: bool,
    pub delivery_at: DateTime<Utc>,
    pub run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-recipient engagement record for a tracked send.
///
/// Workflow sends carry `action_id`; campaign sends carry `campaign_id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TrackingLog {
    pub id: TrackingLogId,
    pub company_id: CompanyId,
    pub campaign_id: Option<CampaignId>,
    pub action_id: Option<ActionId>,
    pub recipient_email: String,
    pub status: String,
    pub error: Option<String>,
    pub open_tracking_id: Option<uuid::Uuid>,
    pub click_tracking_id: Option<uuid::Uuid>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub click_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a tracking log row
#[derive(Debug, Clone)]
pub struct CreateTrackingLog {
    pub company_id: CompanyId,
    pub campaign_id: Option<CampaignId>,
    pub action_id: Option<ActionId>,
    pub recipient_email: String,
    pub open_tracking_id: Option<uuid::Uuid>,
    pub click_tracking_id: Option<uuid::Uuid>,
}

/// Outbound SMTP server credentials, pooled per company
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MailServer {
    pub id: ServerId,
    pub company_id: CompanyId,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Full display name, falling back to the email address
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone(),
        }
    }
}
