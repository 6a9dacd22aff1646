//! Recorded approval status: the engine's memo of past decisions

use crate::{Subject, UserApprovalInput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded status entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStatus {
    pub subject: Subject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<UserApprovalInput>,
    /// Set once, when the input is first recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_time: Option<DateTime<Utc>>,
}

impl ApprovalStatus {
    pub fn pending(subject: Subject) -> Self {
        Self {
            subject,
            operator: None,
            input: None,
            approval_time: None,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.input.is_some()
    }

    pub fn is_approved(&self) -> bool {
        matches!(self.input, Some(UserApprovalInput { approved: true }))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.input, Some(UserApprovalInput { approved: false }))
    }
}

/// Status of one gate, carried forward and merged on each evaluation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalCheckStatus {
    #[serde(default)]
    pub approvals: Vec<ApprovalStatus>,
}

impl ApprovalCheckStatus {
    pub fn new(approvals: Vec<ApprovalStatus>) -> Self {
        Self { approvals }
    }

    /// The recorded decision for `subject`, if one exists
    pub fn decided(&self, subject: &Subject) -> Option<&ApprovalStatus> {
        self.approvals
            .iter()
            .find(|s| &s.subject == subject && s.is_decided())
    }
}
