//! Result Aggregator: folds individual decisions into a gate verdict
//!
//! Reads the validated approval list and the last recorded status, and
//! produces a new status snapshot. Decisions already recorded in the prior
//! status are carried forward untouched, so repeated aggregation of an
//! unchanged list never mints new timestamps.

use std::sync::Arc;

use approval_types::{
    ApprovalCheckStatus, ApprovalPolicy, ApprovalSpec, ApprovalStatus, UserApproval,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::traits::{Clock, SystemClock};

/// Overall state of one gate, or of every gate on a resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateVerdict {
    Approved,
    Denied,
    Pending,
}

/// Result of aggregating one gate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub approved: bool,
    pub denied: bool,
    /// Human-readable provenance; empty while pending
    pub message: String,
    /// Updated status snapshot, always present
    pub status: ApprovalCheckStatus,
}

impl AggregateOutcome {
    pub fn verdict(&self) -> GateVerdict {
        if self.denied {
            GateVerdict::Denied
        } else if self.approved {
            GateVerdict::Approved
        } else {
            GateVerdict::Pending
        }
    }

    fn pending(status: ApprovalCheckStatus) -> Self {
        Self {
            approved: false,
            denied: false,
            message: String::new(),
            status,
        }
    }
}

/// Computes gate verdicts and timestamped status snapshots
#[derive(Clone)]
pub struct ResultAggregator {
    clock: Arc<dyn Clock>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Aggregate `check` under `spec`, merging into `prior`.
    pub fn aggregate(
        &self,
        spec: Option<&ApprovalSpec>,
        check: &[UserApproval],
        prior: Option<&ApprovalCheckStatus>,
    ) -> AggregateOutcome {
        let Some(spec) = spec else {
            return AggregateOutcome {
                message: "nil approvalSpec".to_string(),
                ..AggregateOutcome::pending(prior.cloned().unwrap_or_default())
            };
        };

        let effective_count = spec.eligible_approvers.len().max(check.len());
        let now = self.clock.now();

        let approvals: Vec<ApprovalStatus> = check
            .iter()
            .map(|entry| {
                if let Some(recorded) = prior.and_then(|p| p.decided(&entry.subject)) {
                    return recorded.clone();
                }
                match entry.input {
                    None => ApprovalStatus::pending(entry.subject.clone()),
                    Some(input) => ApprovalStatus {
                        subject: entry.subject.clone(),
                        operator: entry.operator.clone(),
                        input: Some(input),
                        approval_time: Some(now),
                    },
                }
            })
            .collect();
        let status = ApprovalCheckStatus::new(approvals);

        if let Some(rejection) = status.approvals.iter().find(|s| s.is_rejected()) {
            info!(gate = %spec.name, subject = %rejection.subject, "Gate denied");
            return AggregateOutcome {
                approved: false,
                denied: true,
                message: format!(
                    "Rejected by \"{}\" on {}",
                    rejection.subject,
                    format_time(rejection.approval_time)
                ),
                status,
            };
        }

        let approvers: Vec<&ApprovalStatus> =
            status.approvals.iter().filter(|s| s.is_approved()).collect();
        let approved = match spec.policy {
            ApprovalPolicy::Any => !approvers.is_empty(),
            ApprovalPolicy::All | ApprovalPolicy::InOrder => approvers.len() == effective_count,
        };

        if !approved {
            debug!(
                gate = %spec.name,
                approved = approvers.len(),
                required = effective_count,
                "Gate pending"
            );
            return AggregateOutcome::pending(status);
        }

        let message = format!(
            "Approved by {}",
            approvers
                .iter()
                .map(|s| format!("\"{}\" on {}", s.subject, format_time(s.approval_time)))
                .collect::<Vec<_>>()
                .join(", ")
        );
        info!(gate = %spec.name, approvals = approvers.len(), "Gate approved");

        AggregateOutcome {
            approved: true,
            denied: false,
            message,
            status,
        }
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// RFC3339 with second precision and a `Z` suffix
fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Resource-level verdict over every gate on a resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateSummary {
    pub verdict: GateVerdict,
    /// Non-empty per-gate messages, in gate order
    pub messages: Vec<String>,
}

impl GateSummary {
    /// Denied if any gate is denied; approved if there is at least one gate
    /// and all are approved; otherwise pending.
    pub fn from_outcomes(outcomes: &[AggregateOutcome]) -> Self {
        let verdict = if outcomes.iter().any(|o| o.denied) {
            GateVerdict::Denied
        } else if !outcomes.is_empty() && outcomes.iter().all(|o| o.approved) {
            GateVerdict::Approved
        } else {
            GateVerdict::Pending
        };

        Self {
            verdict,
            messages: outcomes
                .iter()
                .filter(|o| !o.message.is_empty())
                .map(|o| o.message.clone())
                .collect(),
        }
    }
}
