//! Polling evaluation of condition actions against engagement data

use crate::store::TrackingStore;
use mailloom_common::types::{CampaignId, ConditionCriteria};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Resolves a condition by polling tracking logs until the criteria is
/// met or the time budget runs out.
pub struct ConditionEvaluator {
    tracking: Arc<dyn TrackingStore>,
    poll_interval: Duration,
}

impl ConditionEvaluator {
    pub fn new(tracking: Arc<dyn TrackingStore>, poll_interval: Duration) -> Self {
        Self {
            tracking,
            poll_interval,
        }
    }

    /// Poll the campaign's tracking logs every `poll_interval` for up to
    /// `budget`. Returns `Some(true)` as soon as the criteria is met,
    /// `Some(false)` when the budget expires, and `None` when the run is
    /// cancelled first.
    pub async fn evaluate(
        &self,
        campaign_id: CampaignId,
        criteria: ConditionCriteria,
        budget: Duration,
        cancel: &CancellationToken,
    ) -> Option<bool> {
        let deadline = tokio::time::sleep(budget);
        tokio::pin!(deadline);
        let mut ticker = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(%campaign_id, "condition evaluation cancelled");
                    return None;
                }
                _ = &mut deadline => {
                    debug!(%campaign_id, ?criteria, "condition not met within budget");
                    return Some(false);
                }
                _ = ticker.tick() => {
                    if self.check(campaign_id, criteria).await {
                        debug!(%campaign_id, ?criteria, "condition met");
                        return Some(true);
                    }
                }
            }
        }
    }

    /// One poll. A storage error counts as not-met so a transient
    /// database failure does not resolve a branch.
    async fn check(&self, campaign_id: CampaignId, criteria: ConditionCriteria) -> bool {
        let logs = match self.tracking.list_by_campaign(campaign_id).await {
            Ok(logs) => logs,
            Err(e) => {
                warn!(%campaign_id, error = %e, "condition poll failed");
                return false;
            }
        };

        logs.iter().any(|log| match criteria {
            ConditionCriteria::Read => log.status == "opened",
            ConditionCriteria::Click => log.click_count > 0,
        })
    }
}
