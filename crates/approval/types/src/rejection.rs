//! Reasons a proposed change to an approval list is refused
//!
//! The rendered messages are user-visible and stable: clients and tests
//! match on them.

use crate::{InputDisplay, Subject, UserApprovalInput};

/// Why the Diff Validator refused a proposed approval list
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("approver \"{0}\" cannot be repeated")]
    DuplicateApprover(Subject),

    #[error("cannot remove \"{0}\" from the approval list")]
    ApproverRemoved(Subject),

    #[error(
        "unable to change the approval result for \"{subject}\" from {} to {}",
        InputDisplay(.old.as_ref()),
        InputDisplay(.new.as_ref())
    )]
    ResultChanged {
        subject: Subject,
        old: Option<UserApprovalInput>,
        new: Option<UserApprovalInput>,
    },

    #[error("Approval policy is \"InOrder\", \"{caller}\" cannot change the order of approvers.")]
    OrderChanged { caller: String },

    #[error("Approval policy is \"InOrder\", \"{subject}\" can not approve before \"{skipped}\".")]
    OutOfOrderApproval { subject: Subject, skipped: Subject },

    #[error("\"{caller}\" can not change the approval user list")]
    UnauthorizedMembershipChange { caller: String },

    #[error("\"{caller}\" can not approve for user \"{subject}\"")]
    UnauthorizedProxyApproval { caller: String, subject: Subject },

    #[error("\"{caller}\" can not change the operator recorded for \"{subject}\"")]
    OperatorChanged { caller: String, subject: Subject },

    #[error("requiresDifferentApprover is enabled, \"{0}\" can not approve.")]
    SelfApprovalBlocked(Subject),

    #[error("internal error: approval spec is missing")]
    MissingApprovalSpec,
}

impl RejectionReason {
    /// Internal reasons mean the engine was handed inconsistent inputs,
    /// not that the caller broke a policy.
    pub fn is_internal(&self) -> bool {
        matches!(self, RejectionReason::MissingApprovalSpec)
    }

    /// Short machine-readable code for structured logs
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::DuplicateApprover(_) => "DUPLICATE_APPROVER",
            RejectionReason::ApproverRemoved(_) => "APPROVER_REMOVED",
            RejectionReason::ResultChanged { .. } => "RESULT_CHANGED",
            RejectionReason::OrderChanged { .. } => "ORDER_CHANGED",
            RejectionReason::OutOfOrderApproval { .. } => "OUT_OF_ORDER_APPROVAL",
            RejectionReason::UnauthorizedMembershipChange { .. } => "UNAUTHORIZED_MEMBERSHIP",
            RejectionReason::UnauthorizedProxyApproval { .. } => "UNAUTHORIZED_PROXY",
            RejectionReason::OperatorChanged { .. } => "OPERATOR_CHANGED",
            RejectionReason::SelfApprovalBlocked(_) => "SELF_APPROVAL_BLOCKED",
            RejectionReason::MissingApprovalSpec => "MISSING_APPROVAL_SPEC",
        }
    }
}
