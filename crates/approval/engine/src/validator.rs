//! Diff Validator: decides whether a proposed approval list is a legal move
//!
//! Validation is a pure predicate over the full proposed list. Checks run in
//! a fixed order and the first failure wins:
//!
//! 1. Both lists empty: nothing to validate.
//! 2. No subject appears twice in the proposed list.
//! 3. No subject is dropped, and no recorded input changes.
//! 4. Callers holding the represent-others privilege skip 5-7 and the proxy
//!    half of 8. The self-approval block still applies to them. Everyone else
//!    also keeps the operator of every recorded decision as it was.
//! 5. A missing spec is only tolerated on create.
//! 6. `InOrder`: existing order is kept and nobody decides ahead of an
//!    undecided predecessor.
//! 7. Subjects added to the list must be eligible approvers.
//! 8. New decisions come from the subject itself (or a privileged caller),
//!    and never from the identity that triggered the gated operation when the
//!    spec forbids it.

use std::collections::HashSet;

use approval_types::{
    ApprovalPolicy, ApprovalSpec, RejectionReason, Subject, TriggeredBy, UserApproval,
};
use tracing::debug;

use crate::config::GateConfig;
use crate::context::{CallerContext, ValidationRequest};
use crate::diff::{index_by_subject, is_newly_decided};

/// Validates one gate's proposed approval list against its previous version
#[derive(Clone, Debug)]
pub struct DiffValidator {
    waive_membership_on_create: bool,
    allow_missing_spec_on_create: bool,
}

impl DiffValidator {
    pub fn new() -> Self {
        Self::from_config(&GateConfig::default())
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            waive_membership_on_create: config.waive_membership_on_create,
            allow_missing_spec_on_create: config.allow_missing_spec_on_create,
        }
    }

    /// Accept or reject the transition described by `request`.
    pub fn validate(&self, request: &ValidationRequest<'_>) -> Result<(), RejectionReason> {
        if request.old.is_empty() && request.new.is_empty() {
            return Ok(());
        }

        check_no_duplicates(request.new)?;
        check_retained(request.old, request.new)?;

        let privileged = request.caller.represent_others;

        let spec = match request.spec {
            Some(spec) => spec,
            None if privileged => return Ok(()),
            None if request.is_create && self.allow_missing_spec_on_create => {
                debug!("no approval spec on create, structural checks only");
                return Ok(());
            }
            None => return Err(RejectionReason::MissingApprovalSpec),
        };

        if !privileged {
            check_operators_kept(request.old, request.new, request.caller)?;

            if spec.policy == ApprovalPolicy::InOrder {
                check_order_kept(request.old, request.new, request.caller)?;
                check_decision_sequence(request.new)?;
            }

            if !(request.is_create && self.waive_membership_on_create) {
                check_membership(request.old, request.new, spec, request.caller)?;
            }
        }

        check_new_decisions(request, spec)
    }
}

impl Default for DiffValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_no_duplicates(new: &[UserApproval]) -> Result<(), RejectionReason> {
    let mut seen = HashSet::with_capacity(new.len());
    for entry in new {
        if !seen.insert(&entry.subject) {
            return Err(RejectionReason::DuplicateApprover(entry.subject.clone()));
        }
    }
    Ok(())
}

fn check_retained(old: &[UserApproval], new: &[UserApproval]) -> Result<(), RejectionReason> {
    let proposed = index_by_subject(new);
    for previous in old {
        let Some(current) = proposed.get(&previous.subject) else {
            return Err(RejectionReason::ApproverRemoved(previous.subject.clone()));
        };
        if previous.input.is_some() && previous.input != current.input {
            return Err(RejectionReason::ResultChanged {
                subject: previous.subject.clone(),
                old: previous.input,
                new: current.input,
            });
        }
    }
    Ok(())
}

/// The operator of a recorded decision is provenance; only privileged callers
/// may rewrite it.
fn check_operators_kept(
    old: &[UserApproval],
    new: &[UserApproval],
    caller: &CallerContext,
) -> Result<(), RejectionReason> {
    let proposed = index_by_subject(new);
    for previous in old.iter().filter(|entry| entry.is_decided()) {
        if let Some(current) = proposed.get(&previous.subject) {
            if current.operator != previous.operator {
                return Err(RejectionReason::OperatorChanged {
                    caller: caller.username().to_string(),
                    subject: previous.subject.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Greedy forward scan: every `old` subject must be found in `new` after the
/// position where the previous one was found.
fn check_order_kept(
    old: &[UserApproval],
    new: &[UserApproval],
    caller: &CallerContext,
) -> Result<(), RejectionReason> {
    let mut cursor = 0;
    for previous in old {
        match new[cursor..]
            .iter()
            .position(|entry| entry.subject == previous.subject)
        {
            Some(offset) => cursor += offset + 1,
            None => {
                return Err(RejectionReason::OrderChanged {
                    caller: caller.username().to_string(),
                })
            }
        }
    }
    Ok(())
}

fn check_decision_sequence(new: &[UserApproval]) -> Result<(), RejectionReason> {
    let mut first_undecided: Option<&Subject> = None;
    for entry in new {
        match (entry.is_decided(), first_undecided) {
            (false, None) => first_undecided = Some(&entry.subject),
            (true, Some(skipped)) => {
                return Err(RejectionReason::OutOfOrderApproval {
                    subject: entry.subject.clone(),
                    skipped: skipped.clone(),
                })
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_membership(
    old: &[UserApproval],
    new: &[UserApproval],
    spec: &ApprovalSpec,
    caller: &CallerContext,
) -> Result<(), RejectionReason> {
    let existing: HashSet<&Subject> = old.iter().map(|a| &a.subject).collect();
    let added_ineligible = new
        .iter()
        .any(|entry| !existing.contains(&entry.subject) && !spec.is_eligible(&entry.subject));

    if added_ineligible {
        return Err(RejectionReason::UnauthorizedMembershipChange {
            caller: caller.username().to_string(),
        });
    }
    Ok(())
}

fn check_new_decisions(
    request: &ValidationRequest<'_>,
    spec: &ApprovalSpec,
) -> Result<(), RejectionReason> {
    let previous = index_by_subject(request.old);
    let caller = request.caller;

    for entry in request
        .new
        .iter()
        .filter(|entry| is_newly_decided(entry, &previous))
    {
        if !caller.represent_others && !caller.identity.matches(&entry.subject) {
            return Err(RejectionReason::UnauthorizedProxyApproval {
                caller: caller.username().to_string(),
                subject: entry.subject.clone(),
            });
        }
        if is_self_approval(spec, request.triggered_by, &entry.subject) {
            return Err(RejectionReason::SelfApprovalBlocked(entry.subject.clone()));
        }
    }
    Ok(())
}

fn is_self_approval(spec: &ApprovalSpec, triggered_by: Option<&TriggeredBy>, subject: &Subject) -> bool {
    spec.requires_different_approver && triggered_by.is_some_and(|t| &t.user == subject)
}
