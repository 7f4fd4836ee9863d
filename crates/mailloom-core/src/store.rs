//! Collaborator seams between the engine and persistence.
//!
//! The engine talks to storage exclusively through these traits; the
//! sqlx repositories implement them below, and tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use mailloom_common::types::{
    ActionId, ActionStatus, CampaignId, CompanyId, MailingListId, TrackingLogId, WorkflowId,
    WorkflowStatus,
};
use mailloom_common::{Error, Result};
use mailloom_storage::models::{
    Action, Campaign, Contact, CreateTrackingLog, MailServer, TrackingLog, Workflow,
};
use mailloom_storage::repository::{
    ActionRepository, CampaignRepository, ContactRepository, ServerRepository,
    TrackingLogRepository, WorkflowRepository,
};
use uuid::Uuid;

fn db_err(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

/// Read/write access to per-recipient engagement records
#[async_trait]
pub trait TrackingStore: Send + Sync {
    async fn create(&self, input: CreateTrackingLog) -> Result<TrackingLog>;
    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<TrackingLog>>;
    async fn find_by_open_tracking_id(&self, tracking_id: Uuid) -> Result<Option<TrackingLog>>;
    async fn find_by_click_tracking_id(&self, tracking_id: Uuid) -> Result<Option<TrackingLog>>;
    async fn mark_opened(&self, id: TrackingLogId) -> Result<()>;
    async fn mark_clicked(&self, id: TrackingLogId) -> Result<()>;
    async fn record_error(&self, id: TrackingLogId, error: &str) -> Result<()>;
}

/// Contacts of a mailing list
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn list_by_mailing_list(&self, mailing_list_id: MailingListId) -> Result<Vec<Contact>>;
}

/// Outbound server pool per company
#[async_trait]
pub trait ServerStore: Send + Sync {
    async fn list_by_company(&self, company_id: CompanyId) -> Result<Vec<MailServer>>;
}

/// Workflow lookup and status transitions
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn get(&self, id: WorkflowId) -> Result<Option<Workflow>>;
    async fn set_status(&self, id: WorkflowId, status: WorkflowStatus) -> Result<()>;
}

/// Action lookup and status transitions
#[async_trait]
pub trait ActionStore: Send + Sync {
    async fn list_by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<Action>>;
    async fn set_status(&self, id: ActionId, status: ActionStatus) -> Result<()>;
}

/// Campaign claiming and status transitions
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn claim_due(&self) -> Result<Vec<Campaign>>;
    async fn mark_sent(&self, id: CampaignId) -> Result<()>;
}

#[async_trait]
impl TrackingStore for TrackingLogRepository {
    async fn create(&self, input: CreateTrackingLog) -> Result<TrackingLog> {
        TrackingLogRepository::create(self, input).await.map_err(db_err)
    }

    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<TrackingLog>> {
        TrackingLogRepository::list_by_campaign(self, campaign_id)
            .await
            .map_err(db_err)
    }

    async fn find_by_open_tracking_id(&self, tracking_id: Uuid) -> Result<Option<TrackingLog>> {
        TrackingLogRepository::find_by_open_tracking_id(self, tracking_id)
            .await
            .map_err(db_err)
    }

    async fn find_by_click_tracking_id(&self, tracking_id: Uuid) -> Result<Option<TrackingLog>> {
        TrackingLogRepository::find_by_click_tracking_id(self, tracking_id)
            .await
            .map_err(db_err)
    }

    async fn mark_opened(&self, id: TrackingLogId) -> Result<()> {
        TrackingLogRepository::mark_opened(self, id).await.map_err(db_err)
    }

    async fn mark_clicked(&self, id: TrackingLogId) -> Result<()> {
        TrackingLogRepository::mark_clicked(self, id).await.map_err(db_err)
    }

    async fn record_error(&self, id: TrackingLogId, error: &str) -> Result<()> {
        TrackingLogRepository::record_error(self, id, error)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl ContactStore for ContactRepository {
    async fn list_by_mailing_list(&self, mailing_list_id: MailingListId) -> Result<Vec<Contact>> {
        ContactRepository::list_by_mailing_list(self, mailing_list_id)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl ServerStore for ServerRepository {
    async fn list_by_company(&self, company_id: CompanyId) -> Result<Vec<MailServer>> {
        ServerRepository::list_by_company(self, company_id)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl WorkflowStore for WorkflowRepository {
    async fn get(&self, id: WorkflowId) -> Result<Option<Workflow>> {
        WorkflowRepository::get(self, id).await.map_err(db_err)
    }

    async fn set_status(&self, id: WorkflowId, status: WorkflowStatus) -> Result<()> {
        WorkflowRepository::set_status(self, id, status)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl ActionStore for ActionRepository {
    async fn list_by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<Action>> {
        ActionRepository::list_by_workflow(self, workflow_id)
            .await
            .map_err(db_err)
    }

    async fn set_status(&self, id: ActionId, status: ActionStatus) -> Result<()> {
        ActionRepository::set_status(self, id, status)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl CampaignStore for CampaignRepository {
    async fn claim_due(&self) -> Result<Vec<Campaign>> {
        CampaignRepository::claim_due(self).await.map_err(db_err)
    }

    async fn mark_sent(&self, id: CampaignId) -> Result<()> {
        CampaignRepository::mark_sent(self, id).await.map_err(db_err)
    }
}
