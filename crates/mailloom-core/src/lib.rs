//! Mailloom Core - Workflow execution, mail dispatch, campaign scheduling
//!
//! This crate provides the execution engine for Mailloom: the workflow
//! executor with condition branching, the multi-server mail dispatcher
//! with engagement tracking, the HTML link rewriter, and the campaign
//! scheduler.

pub mod dispatch;
pub mod scheduler;
pub mod store;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testutil;

pub use dispatch::{DispatchRequest, DispatchSummary, LinkRewriter, MailDispatcher, Mailer, SmtpMailer};
pub use scheduler::CampaignScheduler;
pub use store::{
    ActionStore, CampaignStore, ContactStore, ServerStore, TrackingStore, WorkflowStore,
};
pub use workflow::{ConditionEvaluator, WorkflowExecutor};
