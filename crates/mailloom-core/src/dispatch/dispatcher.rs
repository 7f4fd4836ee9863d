//! Multi-server dispatch of a rendered email to a contact list

use crate::dispatch::mailer::{Mailer, OutgoingEmail};
use crate::dispatch::rewrite::LinkRewriter;
use crate::dispatch::template;
use crate::store::TrackingStore;
use mailloom_common::types::{ActionId, CampaignId, CompanyId};
use mailloom_common::{Error, Result};
use mailloom_storage::models::{Contact, CreateTrackingLog, MailServer};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// One batch of mail to deliver: the content plus the tracking switches.
/// Exactly one of `campaign_id` / `action_id` is set depending on whether
/// the batch comes from the scheduler or a workflow email action.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub company_id: CompanyId,
    pub campaign_id: Option<CampaignId>,
    pub action_id: Option<ActionId>,
    pub subject: String,
    pub html_body: String,
    pub from_address: String,
    pub from_name: Option<String>,
    pub reply_to: Option<String>,
    pub track_open: bool,
    pub track_click: bool,
}

/// Outcome counts for one dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Fans a batch out over the company's server pool. Contacts are split
/// into contiguous shares, one share per server, and the shares are
/// delivered concurrently; within a share delivery is sequential.
pub struct MailDispatcher {
    tracking: Arc<dyn TrackingStore>,
    mailer: Arc<dyn Mailer>,
    rewriter: LinkRewriter,
}

impl MailDispatcher {
    pub fn new(
        tracking: Arc<dyn TrackingStore>,
        mailer: Arc<dyn Mailer>,
        rewriter: LinkRewriter,
    ) -> Self {
        Self {
            tracking,
            mailer,
            rewriter,
        }
    }

    /// Deliver the batch. A recipient failure is recorded on its tracking
    /// row and counted, never aborts the rest of the batch.
    pub async fn dispatch(
        &self,
        servers: &[MailServer],
        contacts: &[Contact],
        request: &DispatchRequest,
    ) -> Result<DispatchSummary> {
        if servers.is_empty() {
            return Err(Error::NoServersAvailable(request.company_id.to_string()));
        }
        if contacts.is_empty() {
            return Ok(DispatchSummary::default());
        }

        let shares = partition(contacts, servers.len());
        let request = Arc::new(request.clone());

        let mut tasks = JoinSet::new();
        for (server, share) in servers.iter().zip(shares) {
            if share.is_empty() {
                continue;
            }
            let server = server.clone();
            let request = Arc::clone(&request);
            let tracking = Arc::clone(&self.tracking);
            let mailer = Arc::clone(&self.mailer);
            let rewriter = self.rewriter.clone();

            tasks.spawn(async move {
                let mut sent = 0usize;
                let mut failed = 0usize;
                for contact in &share {
                    match send_one(&*tracking, &*mailer, &rewriter, &request, &server, contact)
                        .await
                    {
                        Ok(()) => sent += 1,
                        Err(e) => {
                            warn!(
                                recipient = %contact.email,
                                server = %server.name,
                                error = %e,
                                "failed to deliver"
                            );
                            failed += 1;
                        }
                    }
                }
                (sent, failed)
            });
        }

        let mut summary = DispatchSummary {
            attempted: contacts.len(),
            ..Default::default()
        };
        while let Some(joined) = tasks.join_next().await {
            let (sent, failed) = joined.map_err(|e| Error::Internal(e.to_string()))?;
            summary.sent += sent;
            summary.failed += failed;
        }

        debug!(
            attempted = summary.attempted,
            sent = summary.sent,
            failed = summary.failed,
            "dispatch finished"
        );
        Ok(summary)
    }
}

async fn send_one(
    tracking: &dyn TrackingStore,
    mailer: &dyn Mailer,
    rewriter: &LinkRewriter,
    request: &DispatchRequest,
    server: &MailServer,
    contact: &Contact,
) -> Result<()> {
    let subject = template::render(&request.subject, contact);
    let body = template::render(&request.html_body, contact);

    let open_id = request.track_open.then(Uuid::new_v4);
    let click_id = request.track_click.then(Uuid::new_v4);

    // The row exists before the mail goes out so a callback racing the
    // send still resolves.
    let log = if open_id.is_some() || click_id.is_some() {
        Some(
            tracking
                .create(CreateTrackingLog {
                    company_id: request.company_id,
                    campaign_id: request.campaign_id,
                    action_id: request.action_id,
                    recipient_email: contact.email.clone(),
                    open_tracking_id: open_id,
                    click_tracking_id: click_id,
                })
                .await?,
        )
    } else {
        None
    };

    let body = rewriter.apply(&body, &contact.email, open_id, click_id);

    let from = match &request.from_name {
        Some(name) => format!("{} <{}>", name, request.from_address),
        None => request.from_address.clone(),
    };
    let email = OutgoingEmail {
        from,
        reply_to: request.reply_to.clone(),
        to: contact.email.clone(),
        subject,
        html_body: body,
    };

    if let Err(e) = mailer.send(server, &email).await {
        if let Some(log) = &log {
            tracking.record_error(log.id, &e.to_string()).await?;
        }
        return Err(e);
    }
    Ok(())
}

/// Split contacts into `shares` contiguous runs whose sizes differ by at
/// most one; the earlier shares take the extra contacts.
fn partition(contacts: &[Contact], shares: usize) -> Vec<Vec<Contact>> {
    let base = contacts.len() / shares;
    let extra = contacts.len() % shares;

    let mut result = Vec::with_capacity(shares);
    let mut start = 0;
    for i in 0..shares {
        let size = base + usize::from(i < extra);
        result.push(contacts[start..start + size].to_vec());
        start += size;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{contact, server, MemTrackingStore, RecordingMailer};
    use pretty_assertions::assert_eq;

    fn request(company_id: CompanyId) -> DispatchRequest {
        DispatchRequest {
            company_id,
            campaign_id: Some(Uuid::new_v4()),
            action_id: None,
            subject: "Hi {{first_name}}".to_string(),
            html_body: "<body><a href=\"https://x\">go</a></body>".to_string(),
            from_address: "news@example.com".to_string(),
            from_name: Some("News".to_string()),
            reply_to: None,
            track_open: true,
            track_click: true,
        }
    }

    fn contacts(n: usize) -> Vec<Contact> {
        (0..n).map(|i| contact(&format!("c{}@example.com", i))).collect()
    }

    #[test]
    fn test_partition_covers_all_contacts_with_even_skew() {
        for total in [1usize, 2, 5, 7, 12, 100] {
            for shares in [1usize, 2, 3, 5, 8] {
                let all = contacts(total);
                let split = partition(&all, shares);
                assert_eq!(split.len(), shares);

                let flat: Vec<_> = split.iter().flatten().map(|c| c.email.clone()).collect();
                let expected: Vec<_> = all.iter().map(|c| c.email.clone()).collect();
                assert_eq!(flat, expected, "total={} shares={}", total, shares);

                let max = split.iter().map(Vec::len).max().unwrap();
                let min = split.iter().map(Vec::len).min().unwrap();
                assert!(max - min <= 1, "total={} shares={}", total, shares);
            }
        }
    }

    #[test]
    fn test_partition_early_shares_take_remainder() {
        let split = partition(&contacts(7), 3);
        let sizes: Vec<_> = split.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
    }

    #[tokio::test]
    async fn test_no_servers_is_an_error() {
        let company_id = Uuid::new_v4();
        let dispatcher = MailDispatcher::new(
            Arc::new(MemTrackingStore::new()),
            Arc::new(RecordingMailer::new()),
            LinkRewriter::new("https://track.example.com"),
        );

        let err = dispatcher
            .dispatch(&[], &contacts(3), &request(company_id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoServersAvailable(_)));
    }

    #[tokio::test]
    async fn test_every_recipient_gets_one_tracking_row() {
        let company_id = Uuid::new_v4();
        let tracking = Arc::new(MemTrackingStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = MailDispatcher::new(
            Arc::clone(&tracking) as Arc<dyn TrackingStore>,
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            LinkRewriter::new("https://track.example.com"),
        );

        let servers = vec![server(company_id), server(company_id)];
        let all = contacts(5);
        let summary = dispatcher
            .dispatch(&servers, &all, &request(company_id))
            .await
            .unwrap();

        assert_eq!(
            summary,
            DispatchSummary {
                attempted: 5,
                sent: 5,
                failed: 0
            }
        );

        let rows = tracking.rows.lock().unwrap();
        assert_eq!(rows.len(), 5);
        for row in rows.iter() {
            assert!(row.open_tracking_id.is_some());
            assert!(row.click_tracking_id.is_some());
            assert!(all.iter().any(|c| c.email == row.recipient_email));
        }

        let mut sent = mailer.recipients();
        sent.sort();
        let mut expected: Vec<_> = all.iter().map(|c| c.email.clone()).collect();
        expected.sort();
        assert_eq!(sent, expected);
    }

    #[tokio::test]
    async fn test_tracking_ids_follow_flags() {
        let company_id = Uuid::new_v4();
        let tracking = Arc::new(MemTrackingStore::new());
        let dispatcher = MailDispatcher::new(
            Arc::clone(&tracking) as Arc<dyn TrackingStore>,
            Arc::new(RecordingMailer::new()),
            LinkRewriter::new("https://track.example.com"),
        );

        let mut req = request(company_id);
        req.track_click = false;
        dispatcher
            .dispatch(&[server(company_id)], &contacts(1), &req)
            .await
            .unwrap();

        let rows = tracking.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].open_tracking_id.is_some());
        assert!(rows[0].click_tracking_id.is_none());
    }

    #[tokio::test]
    async fn test_no_tracking_row_when_both_flags_off() {
        let company_id = Uuid::new_v4();
        let tracking = Arc::new(MemTrackingStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = MailDispatcher::new(
            Arc::clone(&tracking) as Arc<dyn TrackingStore>,
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            LinkRewriter::new("https://track.example.com"),
        );

        let mut req = request(company_id);
        req.track_open = false;
        req.track_click = false;
        req.html_body = "<body><a href=\"https://x\">go</a></body>".to_string();
        dispatcher
            .dispatch(&[server(company_id)], &contacts(1), &req)
            .await
            .unwrap();

        assert!(tracking.rows.lock().unwrap().is_empty());
        let sent = mailer.sent.lock().unwrap();
        // body left untouched when tracking is off
        assert_eq!(sent[0].1.html_body, req.html_body);
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_abort_batch() {
        let company_id = Uuid::new_v4();
        let tracking = Arc::new(MemTrackingStore::new());
        let mailer = Arc::new(RecordingMailer::failing_for(&["c1@example.com"]));
        let dispatcher = MailDispatcher::new(
            Arc::clone(&tracking) as Arc<dyn TrackingStore>,
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            LinkRewriter::new("https://track.example.com"),
        );

        let summary = dispatcher
            .dispatch(&[server(company_id)], &contacts(3), &request(company_id))
            .await
            .unwrap();
        assert_eq!(
            summary,
            DispatchSummary {
                attempted: 3,
                sent: 2,
                failed: 1
            }
        );

        let rows = tracking.rows.lock().unwrap();
        let failed: Vec<_> = rows.iter().filter(|r| r.error.is_some()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].recipient_email, "c1@example.com");
    }

    #[tokio::test]
    async fn test_subject_and_body_are_personalized() {
        let company_id = Uuid::new_v4();
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = MailDispatcher::new(
            Arc::new(MemTrackingStore::new()),
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            LinkRewriter::new("https://track.example.com"),
        );

        dispatcher
            .dispatch(&[server(company_id)], &contacts(1), &request(company_id))
            .await
            .unwrap();

        assert_eq!(mailer.subjects(), vec!["Hi Jo".to_string()]);
        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].1.html_body.contains("/track/click/"));
        assert!(sent[0].1.html_body.contains("/track/open/"));
        assert_eq!(sent[0].1.from, "News <news@example.com>");
    }
}
