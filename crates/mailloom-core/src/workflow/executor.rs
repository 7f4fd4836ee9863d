//! Concurrent execution of a workflow's action tree

use crate::dispatch::{DispatchRequest, MailDispatcher};
use crate::store::{ActionStore, ContactStore, ServerStore, WorkflowStore};
use crate::workflow::condition::ConditionEvaluator;
use crate::workflow::graph;
use mailloom_common::types::{
    parse_duration, ActionId, ActionKind, ActionStatus, CampaignId, CompanyId, ConditionCriteria,
    WorkflowId, WorkflowStatus,
};
use mailloom_common::{Error, Result};
use mailloom_storage::models::{Action, Contact, MailServer};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct EmailPayload {
    subject: String,
    track_open: bool,
    track_click: bool,
    html: String,
    from: String,
    #[serde(rename = "reply-to")]
    reply_to: String,
}

#[derive(Debug, Deserialize)]
struct WaitPayload {
    duration: String,
}

#[derive(Debug, Deserialize)]
struct ConditionPayload {
    criteria: ConditionCriteria,
    #[serde(rename = "campaignID")]
    campaign_id: CampaignId,
    duration: String,
}

/// Branch selector on an action gated by a condition parent. Absent
/// means the met branch.
#[derive(Debug, Deserialize)]
struct RoutePayload {
    #[serde(default = "default_route")]
    route: bool,
}

impl Default for RoutePayload {
    fn default() -> Self {
        Self { route: true }
    }
}

fn default_route() -> bool {
    true
}

/// Runs workflows: one concurrent task per action, with per-edge
/// one-shot gates between a condition and each of its dependents.
pub struct WorkflowExecutor {
    workflows: Arc<dyn WorkflowStore>,
    actions: Arc<dyn ActionStore>,
    contacts: Arc<dyn ContactStore>,
    servers: Arc<dyn ServerStore>,
    dispatcher: Arc<MailDispatcher>,
    evaluator: Arc<ConditionEvaluator>,
}

impl WorkflowExecutor {
    pub fn new(
        workflows: Arc<dyn WorkflowStore>,
        actions: Arc<dyn ActionStore>,
        contacts: Arc<dyn ContactStore>,
        servers: Arc<dyn ServerStore>,
        dispatcher: Arc<MailDispatcher>,
        evaluator: Arc<ConditionEvaluator>,
    ) -> Self {
        Self {
            workflows,
            actions,
            contacts,
            servers,
            dispatcher,
            evaluator,
        }
    }

    /// Execute one workflow run to completion. Returns after every
    /// action task has finished; the first action error is returned but
    /// never aborts the remaining tasks.
    pub async fn run(&self, workflow_id: WorkflowId, cancel: CancellationToken) -> Result<()> {
        let workflow = self
            .workflows
            .get(workflow_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Workflow {}", workflow_id)))?;

        let actions = self.actions.list_by_workflow(workflow_id).await?;
        if actions.is_empty() {
            return Err(Error::Validation(format!(
                "Workflow {} has no actions",
                workflow_id
            )));
        }

        let order = graph::execution_order(&actions)?;

        // reject unknown kinds before any action runs
        let mut kinds: HashMap<ActionId, ActionKind> = HashMap::new();
        for action in &actions {
            kinds.insert(action.id, action.kind.parse()?);
        }

        let contacts = Arc::new(
            self.contacts
                .list_by_mailing_list(workflow.mailing_list_id)
                .await?,
        );
        let servers = Arc::new(self.servers.list_by_company(workflow.company_id).await?);

        self.workflows
            .set_status(workflow_id, WorkflowStatus::Running)
            .await?;
        info!(%workflow_id, actions = actions.len(), "workflow run started");

        // One gate per condition->dependent edge so every dependent
        // observes the outcome independently.
        let mut gates: HashMap<ActionId, oneshot::Receiver<bool>> = HashMap::new();
        let mut branches: HashMap<ActionId, Vec<oneshot::Sender<bool>>> = HashMap::new();
        for action in &actions {
            if let Some(parent) = action.parent_id {
                if kinds[&parent] == ActionKind::Condition {
                    let (tx, rx) = oneshot::channel();
                    branches.entry(parent).or_default().push(tx);
                    gates.insert(action.id, rx);
                }
            }
        }

        let mut by_id: HashMap<ActionId, Action> =
            actions.into_iter().map(|a| (a.id, a)).collect();

        let mut tasks = JoinSet::new();
        for id in order {
            let task = ActionTask {
                action: by_id.remove(&id).ok_or_else(|| {
                    Error::Internal(format!("Action {} missing from workflow", id))
                })?,
                company_id: workflow.company_id,
                contacts: Arc::clone(&contacts),
                servers: Arc::clone(&servers),
                actions: Arc::clone(&self.actions),
                dispatcher: Arc::clone(&self.dispatcher),
                evaluator: Arc::clone(&self.evaluator),
                gate: gates.remove(&id),
                branches: branches.remove(&id).unwrap_or_default(),
                cancel: cancel.clone(),
            };
            tasks.spawn(task.run());
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(%workflow_id, error = %e, "action task failed");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(Error::Internal(e.to_string()));
                }
            }
        }

        let final_status = if cancel.is_cancelled() {
            WorkflowStatus::Canceled
        } else {
            WorkflowStatus::Completed
        };
        self.workflows.set_status(workflow_id, final_status).await?;
        info!(%workflow_id, status = %final_status, "workflow run finished");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct ActionTask {
    action: Action,
    company_id: CompanyId,
    contacts: Arc<Vec<Contact>>,
    servers: Arc<Vec<MailServer>>,
    actions: Arc<dyn ActionStore>,
    dispatcher: Arc<MailDispatcher>,
    evaluator: Arc<ConditionEvaluator>,
    gate: Option<oneshot::Receiver<bool>>,
    branches: Vec<oneshot::Sender<bool>>,
    cancel: CancellationToken,
}

impl ActionTask {
    async fn run(mut self) -> Result<()> {
        if let Some(gate) = self.gate.take() {
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                resolved = gate => match resolved {
                    Ok(outcome) => outcome,
                    // the condition never resolved; skip without side effects
                    Err(_) => return Ok(()),
                },
            };

            let route: RoutePayload =
                serde_json::from_value(self.action.data.clone()).unwrap_or_default();
            if outcome != route.route {
                debug!(
                    action_id = %self.action.id,
                    outcome,
                    route = route.route,
                    "branch not taken"
                );
                return Ok(());
            }
        }

        match self.action.kind.parse::<ActionKind>()? {
            ActionKind::Email => self.run_email().await,
            ActionKind::Wait => self.run_wait().await,
            ActionKind::Condition => self.run_condition().await,
        }
    }

    async fn run_email(self) -> Result<()> {
        let payload: EmailPayload = serde_json::from_value(self.action.data.clone())
            .map_err(|e| Error::Validation(format!("Invalid email action data: {}", e)))?;

        let reply_to = if payload.reply_to.is_empty() {
            None
        } else {
            Some(payload.reply_to.clone())
        };
        let request = DispatchRequest {
            company_id: self.company_id,
            campaign_id: None,
            action_id: Some(self.action.id),
            subject: payload.subject,
            html_body: payload.html,
            from_address: payload.from,
            from_name: None,
            reply_to,
            track_open: payload.track_open,
            track_click: payload.track_click,
        };

        let summary = self
            .dispatcher
            .dispatch(&self.servers, &self.contacts, &request)
            .await?;
        info!(
            action_id = %self.action.id,
            sent = summary.sent,
            failed = summary.failed,
            "email action dispatched"
        );

        self.actions
            .set_status(self.action.id, ActionStatus::Completed)
            .await
    }

    async fn run_wait(self) -> Result<()> {
        let payload: WaitPayload = serde_json::from_value(self.action.data.clone())
            .map_err(|e| Error::Validation(format!("Invalid wait action data: {}", e)))?;
        let duration = parse_duration(&payload.duration)?;

        self.actions
            .set_status(self.action.id, ActionStatus::Waiting)
            .await?;
        debug!(action_id = %self.action.id, ?duration, "wait action sleeping");

        tokio::select! {
            _ = self.cancel.cancelled() => {
                self.actions
                    .set_status(self.action.id, ActionStatus::Canceled)
                    .await
            }
            _ = tokio::time::sleep(duration) => {
                self.actions
                    .set_status(self.action.id, ActionStatus::Completed)
                    .await
            }
        }
    }

    async fn run_condition(mut self) -> Result<()> {
        let payload: ConditionPayload = serde_json::from_value(self.action.data.clone())
            .map_err(|e| Error::Validation(format!("Invalid condition action data: {}", e)))?;
        let budget = parse_duration(&payload.duration)?;

        match self
            .evaluator
            .evaluate(payload.campaign_id, payload.criteria, budget, &self.cancel)
            .await
        {
            Some(outcome) => {
                debug!(action_id = %self.action.id, outcome, "condition resolved");
                for branch in self.branches.drain(..) {
                    // a dependent may already be gone; nothing to do then
                    let _ = branch.send(outcome);
                }
                Ok(())
            }
            None => {
                // cancelled; dropping the senders skips every dependent
                self.actions
                    .set_status(self.action.id, ActionStatus::Canceled)
                    .await
            }
        }
    }
}
