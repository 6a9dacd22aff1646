//! Per-subject approval line items and the check they form

use crate::Subject;
use serde::{Deserialize, Serialize};

/// A subject's decision. Absence on a [`UserApproval`] means "not yet decided".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserApprovalInput {
    pub approved: bool,
}

impl UserApprovalInput {
    pub fn approve() -> Self {
        Self { approved: true }
    }

    pub fn reject() -> Self {
        Self { approved: false }
    }
}

impl std::fmt::Display for UserApprovalInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.approved {
            write!(f, "approved")
        } else {
            write!(f, "rejected")
        }
    }
}

/// Renders an optional input for messages: `approved`, `rejected` or `none`.
pub struct InputDisplay<'a>(pub Option<&'a UserApprovalInput>);

impl std::fmt::Display for InputDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(input) => input.fmt(f),
            None => write!(f, "none"),
        }
    }
}

/// One line item of an approval list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserApproval {
    pub subject: Subject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<UserApprovalInput>,
    /// Who actually submitted `input`, when that was not `subject` itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Subject>,
}

impl UserApproval {
    /// An undecided placeholder for `subject`
    pub fn pending(subject: Subject) -> Self {
        Self {
            subject,
            input: None,
            operator: None,
        }
    }

    pub fn approved(subject: Subject) -> Self {
        Self::pending(subject).with_input(UserApprovalInput::approve())
    }

    pub fn rejected(subject: Subject) -> Self {
        Self::pending(subject).with_input(UserApprovalInput::reject())
    }

    pub fn with_input(mut self, input: UserApprovalInput) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_operator(mut self, operator: Subject) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn is_decided(&self) -> bool {
        self.input.is_some()
    }
}

/// Ordered approval list; order matters only under `InOrder`.
pub type UserApprovalList = Vec<UserApproval>;

/// The mutable approval record attached to a gated resource for one gate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalCheck {
    /// Name of the governing [`crate::ApprovalSpec`]
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub approvals: UserApprovalList,
}

impl ApprovalCheck {
    pub fn new(name: impl Into<String>, approvals: UserApprovalList) -> Self {
        Self {
            name: name.into(),
            approvals,
        }
    }

    /// Look up the entry for `subject`
    pub fn find(&self, subject: &Subject) -> Option<&UserApproval> {
        self.approvals.iter().find(|a| &a.subject == subject)
    }
}
