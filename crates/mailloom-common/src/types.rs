//! Common types for Mailloom

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for companies (tenants)
pub type CompanyId = Uuid;

/// Unique identifier for workflows
pub type WorkflowId = Uuid;

/// Unique identifier for workflow actions
pub type ActionId = Uuid;

/// Unique identifier for campaigns
pub type CampaignId = Uuid;

/// Unique identifier for mailing lists
pub type MailingListId = Uuid;

/// Unique identifier for contacts
pub type ContactId = Uuid;

/// Unique identifier for outbound mail servers
pub type ServerId = Uuid;

/// Unique identifier for tracking log rows
pub type TrackingLogId = Uuid;

/// Workflow action kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Email,
    Wait,
    Condition,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Email => "email",
            ActionKind::Wait => "wait",
            ActionKind::Condition => "condition",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ActionKind::Email),
            "wait" => Ok(ActionKind::Wait),
            "condition" => Ok(ActionKind::Condition),
            other => Err(crate::Error::Validation(format!(
                "Unknown action kind: {}",
                other
            ))),
        }
    }
}

/// Workflow action status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Waiting,
    Completed,
    Canceled,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Waiting => "waiting",
            ActionStatus::Completed => "completed",
            ActionStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Draft,
    Running,
    Completed,
    Canceled,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Campaign status. Monotonic: pending -> sending -> sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Sending,
    Sent,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Sending => "sending",
            CampaignStatus::Sent => "sent",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engagement status of a tracking log row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    Pending,
    Opened,
    Clicked,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Pending => "pending",
            TrackingStatus::Opened => "opened",
            TrackingStatus::Clicked => "clicked",
        }
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Branch criteria for condition actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCriteria {
    /// Satisfied once any recipient opened the campaign email
    Read,
    /// Satisfied once any recipient clicked a tracked link
    Click,
}

impl std::fmt::Display for ConditionCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionCriteria::Read => f.write_str("read"),
            ConditionCriteria::Click => f.write_str("click"),
        }
    }
}

/// Parse a duration string of the form `"300ms"`, `"30s"`, `"1h30m"`, `"2d"`.
///
/// Accepts one or more integer segments with `ms`, `s`, `m`, `h` or `d`
/// units; segments are summed. Bare numbers without a unit are rejected.
pub fn parse_duration(s: &str) -> crate::Result<Duration> {
    let input = s.trim();
    if input.is_empty() {
        return Err(crate::Error::Validation("Empty duration".to_string()));
    }

    let mut total = Duration::ZERO;
    let mut chars = input.chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                digits.push(*c);
                chars.next();
            } else {
                break;
            }
        }

        let mut unit = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_alphabetic() {
                unit.push(*c);
                chars.next();
            } else {
                break;
            }
        }

        if digits.is_empty() || unit.is_empty() {
            return Err(crate::Error::Validation(format!(
                "Invalid duration format: {}",
                s
            )));
        }

        let value: u64 = digits
            .parse()
            .map_err(|_| crate::Error::Validation(format!("Invalid duration format: {}", s)))?;

        let segment = match unit.as_str() {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value * 60),
            "h" => Duration::from_secs(value * 3600),
            "d" => Duration::from_secs(value * 86_400),
            other => {
                return Err(crate::Error::Validation(format!(
                    "Unknown duration unit: {}",
                    other
                )))
            }
        };
        total += segment;
    }

    Ok(total)
}
