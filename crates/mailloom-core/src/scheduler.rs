//! Periodic claiming and dispatch of due campaigns

use crate::dispatch::{DispatchRequest, MailDispatcher};
use crate::store::{CampaignStore, ContactStore, ServerStore};
use mailloom_storage::models::Campaign;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Polls for campaigns whose delivery time has passed and hands each one
/// to the dispatcher. Claiming is an atomic status transition, so two
/// scheduler instances never send the same campaign twice.
pub struct CampaignScheduler {
    campaigns: Arc<dyn CampaignStore>,
    contacts: Arc<dyn ContactStore>,
    servers: Arc<dyn ServerStore>,
    dispatcher: Arc<MailDispatcher>,
    tick_interval: Duration,
}

impl CampaignScheduler {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        contacts: Arc<dyn ContactStore>,
        servers: Arc<dyn ServerStore>,
        dispatcher: Arc<MailDispatcher>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            campaigns,
            contacts,
            servers,
            dispatcher,
            tick_interval,
        }
    }

    /// Run until cancelled, ticking at the configured interval.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval = ?self.tick_interval, "campaign scheduler started");
        let mut ticker = tokio::time::interval(self.tick_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("campaign scheduler stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One scheduler pass: claim everything due, dispatch each campaign.
    /// A claimed campaign always ends `sent`; per-recipient failures stay
    /// on the tracking rows.
    pub async fn tick(&self) {
        let due = match self.campaigns.claim_due().await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "failed to claim due campaigns");
                return;
            }
        };
        if due.is_empty() {
            return;
        }
        debug!(count = due.len(), "claimed due campaigns");

        for campaign in due {
            if let Err(e) = self.send_campaign(&campaign).await {
                error!(campaign_id = %campaign.id, error = %e, "campaign dispatch failed");
            }
            if let Err(e) = self.campaigns.mark_sent(campaign.id).await {
                error!(campaign_id = %campaign.id, error = %e, "failed to mark campaign sent");
            }
        }
    }

    async fn send_campaign(&self, campaign: &Campaign) -> mailloom_common::Result<()> {
        let contacts = self
            .contacts
            .list_by_mailing_list(campaign.mailing_list_id)
            .await?;
        let servers = self.servers.list_by_company(campaign.company_id).await?;

        let request = DispatchRequest {
            company_id: campaign.company_id,
            campaign_id: Some(campaign.id),
            action_id: None,
            subject: campaign.subject.clone(),
            html_body: campaign.html_body.clone(),
            from_address: campaign.from_address.clone(),
            from_name: campaign.from_name.clone(),
            reply_to: campaign.reply_to.clone(),
            track_open: campaign.track_open,
            track_click: campaign.track_click,
        };

        let summary = self
            .dispatcher
            .dispatch(&servers, &contacts, &request)
            .await?;
        info!(
            campaign_id = %campaign.id,
            attempted = summary.attempted,
            sent = summary.sent,
            failed = summary.failed,
            "campaign dispatched"
        );
        Ok(())
    }
}
