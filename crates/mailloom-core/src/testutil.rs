//! In-memory store fakes and model builders shared by the engine tests

use async_trait::async_trait;
use chrono::Utc;
use mailloom_common::types::{
    ActionId, ActionStatus, CampaignId, CompanyId, MailingListId, TrackingLogId, WorkflowId,
    WorkflowStatus,
};
use mailloom_common::{Error, Result};
use mailloom_storage::models::{
    Action, Campaign, Contact, CreateTrackingLog, MailServer, TrackingLog, Workflow,
};
use std::sync::Mutex;
use uuid::Uuid;

use crate::dispatch::{Mailer, OutgoingEmail};
use crate::store::{
    ActionStore, CampaignStore, ContactStore, ServerStore, TrackingStore, WorkflowStore,
};

pub fn contact(email: &str) -> Contact {
    Contact {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: Some("Jo".to_string()),
        last_name: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn server(company_id: CompanyId) -> MailServer {
    MailServer {
        id: Uuid::new_v4(),
        company_id,
        name: "smtp-1".to_string(),
        host: "smtp.example.com".to_string(),
        port: 587,
        username: "user".to_string(),
        password: "secret".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn workflow(company_id: CompanyId, mailing_list_id: MailingListId) -> Workflow {
    Workflow {
        id: Uuid::new_v4(),
        company_id,
        mailing_list_id,
        name: "welcome".to_string(),
        status: "draft".to_string(),
        current_step: 0,
        trigger: "manual".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn action(
    workflow_id: WorkflowId,
    parent_id: Option<ActionId>,
    kind: &str,
    data: serde_json::Value,
) -> Action {
    Action {
        id: Uuid::new_v4(),
        workflow_id,
        parent_id,
        name: kind.to_string(),
        kind: kind.to_string(),
        status: "pending".to_string(),
        data,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn campaign(company_id: CompanyId, mailing_list_id: MailingListId) -> Campaign {
    Campaign {
        id: Uuid::new_v4(),
        company_id,
        mailing_list_id,
        name: "launch".to_string(),
        subject: "Big news".to_string(),
        html_body: "<body><a href=\"https://example.com\">go</a></body>".to_string(),
        plain_body: None,
        from_address: "news@example.com".to_string(),
        from_name: Some("News".to_string()),
        reply_to: None,
        status: "pending".to_string(),
        track_open: true,
        track_click: true,
        delivery_at: Utc::now() - chrono::Duration::minutes(5),
        run_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Tracking store over a plain vector
#[derive(Default)]
pub struct MemTrackingStore {
    pub rows: Mutex<Vec<TrackingLog>>,
}

impl MemTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, row: TrackingLog) {
        self.rows.lock().unwrap().push(row);
    }

    /// Record a click on every row of the campaign, as the inbound
    /// callback would.
    pub fn click_campaign(&self, campaign_id: CampaignId) {
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut() {
            if row.campaign_id == Some(campaign_id) {
                row.status = "clicked".to_string();
                row.click_count += 1;
            }
        }
    }
}

pub fn tracking_row(campaign_id: CampaignId) -> TrackingLog {
    TrackingLog {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        campaign_id: Some(campaign_id),
        action_id: None,
        recipient_email: "jo@example.com".to_string(),
        status: "pending".to_string(),
        error: None,
        open_tracking_id: Some(Uuid::new_v4()),
        click_tracking_id: Some(Uuid::new_v4()),
        opened_at: None,
        clicked_at: None,
        click_count: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl TrackingStore for MemTrackingStore {
    async fn create(&self, input: CreateTrackingLog) -> Result<TrackingLog> {
        let row = TrackingLog {
            id: Uuid::new_v4(),
            company_id: input.company_id,
            campaign_id: input.campaign_id,
            action_id: input.action_id,
            recipient_email: input.recipient_email,
            status: "pending".to_string(),
            error: None,
            open_tracking_id: input.open_tracking_id,
            click_tracking_id: input.click_tracking_id,
            opened_at: None,
            clicked_at: None,
            click_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<TrackingLog>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.campaign_id == Some(campaign_id))
            .cloned()
            .collect())
    }

    async fn find_by_open_tracking_id(&self, tracking_id: Uuid) -> Result<Option<TrackingLog>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.open_tracking_id == Some(tracking_id))
            .cloned())
    }

    async fn find_by_click_tracking_id(&self, tracking_id: Uuid) -> Result<Option<TrackingLog>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.click_tracking_id == Some(tracking_id))
            .cloned())
    }

    async fn mark_opened(&self, id: TrackingLogId) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.status = "opened".to_string();
            row.opened_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn mark_clicked(&self, id: TrackingLogId) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.status = "clicked".to_string();
            row.clicked_at = Some(Utc::now());
            row.click_count += 1;
        }
        Ok(())
    }

    async fn record_error(&self, id: TrackingLogId, error: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.error = Some(error.to_string());
        }
        Ok(())
    }
}

/// Mailer that records every send instead of speaking SMTP
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(Uuid, OutgoingEmail)>>,
    pub fail_recipients: Vec<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_recipients: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, email)| email.to.clone())
            .collect()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, email)| email.subject.clone())
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, server: &MailServer, email: &OutgoingEmail) -> Result<()> {
        if self.fail_recipients.contains(&email.to) {
            return Err(Error::Smtp("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push((server.id, email.clone()));
        Ok(())
    }
}

/// Workflow store holding a single workflow
pub struct MemWorkflowStore {
    pub workflow: Mutex<Workflow>,
}

impl MemWorkflowStore {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow: Mutex::new(workflow),
        }
    }

    pub fn status(&self) -> String {
        self.workflow.lock().unwrap().status.clone()
    }
}

#[async_trait]
impl WorkflowStore for MemWorkflowStore {
    async fn get(&self, id: WorkflowId) -> Result<Option<Workflow>> {
        let workflow = self.workflow.lock().unwrap();
        if workflow.id == id {
            Ok(Some(workflow.clone()))
        } else {
            Ok(None)
        }
    }

    async fn set_status(&self, id: WorkflowId, status: WorkflowStatus) -> Result<()> {
        let mut workflow = self.workflow.lock().unwrap();
        if workflow.id == id {
            workflow.status = status.to_string();
        }
        Ok(())
    }
}

/// Action store over a plain vector
pub struct MemActionStore {
    pub actions: Mutex<Vec<Action>>,
}

impl MemActionStore {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions: Mutex::new(actions),
        }
    }

    pub fn status_of(&self, id: ActionId) -> Option<String> {
        self.actions
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.status.clone())
    }
}

#[async_trait]
impl ActionStore for MemActionStore {
    async fn list_by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<Action>> {
        Ok(self
            .actions
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.workflow_id == workflow_id)
            .cloned()
            .collect())
    }

    async fn set_status(&self, id: ActionId, status: ActionStatus) -> Result<()> {
        let mut actions = self.actions.lock().unwrap();
        if let Some(action) = actions.iter_mut().find(|a| a.id == id) {
            action.status = status.to_string();
        }
        Ok(())
    }
}

/// Contact store over a fixed list
pub struct MemContactStore {
    pub contacts: Vec<Contact>,
}

#[async_trait]
impl ContactStore for MemContactStore {
    async fn list_by_mailing_list(&self, _mailing_list_id: MailingListId) -> Result<Vec<Contact>> {
        Ok(self.contacts.clone())
    }
}

/// Server store over a fixed pool
pub struct MemServerStore {
    pub servers: Vec<MailServer>,
}

#[async_trait]
impl ServerStore for MemServerStore {
    async fn list_by_company(&self, _company_id: CompanyId) -> Result<Vec<MailServer>> {
        Ok(self.servers.clone())
    }
}

/// Campaign store over a plain vector, with claim semantics matching the
/// repository's conditional update.
pub struct MemCampaignStore {
    pub campaigns: Mutex<Vec<Campaign>>,
}

impl MemCampaignStore {
    pub fn new(campaigns: Vec<Campaign>) -> Self {
        Self {
            campaigns: Mutex::new(campaigns),
        }
    }

    pub fn status_of(&self, id: CampaignId) -> Option<String> {
        self.campaigns
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.status.clone())
    }
}

#[async_trait]
impl CampaignStore for MemCampaignStore {
    async fn claim_due(&self) -> Result<Vec<Campaign>> {
        let now = Utc::now();
        let mut campaigns = self.campaigns.lock().unwrap();
        let mut claimed = Vec::new();
        for campaign in campaigns.iter_mut() {
            if campaign.status == "pending" && campaign.delivery_at < now {
                campaign.status = "sending".to_string();
                campaign.run_at = Some(now);
                claimed.push(campaign.clone());
            }
        }
        Ok(claimed)
    }

    async fn mark_sent(&self, id: CampaignId) -> Result<()> {
        let mut campaigns = self.campaigns.lock().unwrap();
        if let Some(campaign) = campaigns.iter_mut().find(|c| c.id == id) {
            campaign.status = "sent".to_string();
        }
        Ok(())
    }
}
