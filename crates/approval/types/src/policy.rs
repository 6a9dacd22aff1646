//! Approval policies: how many and which subjects must agree

use crate::Subject;
use serde::{Deserialize, Serialize};

/// How individual decisions combine into a gate verdict
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ApprovalPolicy {
    /// A single approval suffices
    #[default]
    Any,
    /// Every eligible or listed approver must approve
    All,
    /// Like `All`, but decisions must arrive in list order
    InOrder,
}

impl std::fmt::Display for ApprovalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalPolicy::Any => write!(f, "Any"),
            ApprovalPolicy::All => write!(f, "All"),
            ApprovalPolicy::InOrder => write!(f, "InOrder"),
        }
    }
}

/// The policy governing one approval gate.
///
/// Owned by the resource's controlling configuration; the engine only reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSpec {
    /// Gate name, used to pair the spec with its check in logs
    #[serde(default)]
    pub name: String,
    pub policy: ApprovalPolicy,
    /// Subjects allowed to be on the approval list, in required order for `InOrder`
    #[serde(default)]
    pub eligible_approvers: Vec<Subject>,
    /// Forbid the identity that triggered the gated operation from approving it
    #[serde(default)]
    pub requires_different_approver: bool,
}

impl ApprovalSpec {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_approver(mut self, subject: Subject) -> Self {
        self.eligible_approvers.push(subject);
        self
    }

    pub fn with_approvers(mut self, subjects: impl IntoIterator<Item = Subject>) -> Self {
        self.eligible_approvers.extend(subjects);
        self
    }

    pub fn requiring_different_approver(mut self) -> Self {
        self.requires_different_approver = true;
        self
    }

    pub fn is_eligible(&self, subject: &Subject) -> bool {
        self.eligible_approvers.contains(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_deserializes_from_camel_case() {
        let spec: ApprovalSpec = serde_json::from_value(serde_json::json!({
            "name": "release",
            "policy": "InOrder",
            "eligibleApprovers": [{"kind": "User", "name": "alice"}],
            "requiresDifferentApprover": true
        }))
        .unwrap();

        assert_eq!(spec.policy, ApprovalPolicy::InOrder);
        assert!(spec.requires_different_approver);
        assert!(spec.is_eligible(&Subject::user("alice")));
        assert!(!spec.is_eligible(&Subject::user("bob")));
    }
}
