use std::sync::Arc;

use approval_types::{
    ApprovalCheck, ApprovalCheckStatus, ApprovalSpec, CallerIdentity, Decision, Operation,
    UserApproval,
};
use tracing::{debug, info, warn};

use crate::aggregator::{AggregateOutcome, GateSummary, ResultAggregator};
use crate::capability::{supports, Capability};
use crate::config::GateConfig;
use crate::context::{AdmissionRequest, CallerContext, ValidationRequest};
use crate::error::{GateError, GateResult};
use crate::tagger::OperatorTagger;
use crate::traits::{Clock, GatedResource, PrivilegeProbe};
use crate::validator::DiffValidator;

/// The Approval Gate: entry point called by the hook framework.
///
/// Wires the privilege probe, the Diff Validator, the Operator Tagger and the
/// Result Aggregator together. Holds no per-request state; one instance can
/// serve concurrent requests behind an `Arc`.
pub struct ApprovalGate {
    probe: Arc<dyn PrivilegeProbe>,
    validator: DiffValidator,
    tagger: OperatorTagger,
    aggregator: ResultAggregator,
    config: GateConfig,
}

impl ApprovalGate {
    /// Create a new Approval Gate.
    pub fn new(probe: Arc<dyn PrivilegeProbe>, config: GateConfig) -> Self {
        Self {
            probe,
            validator: DiffValidator::from_config(&config),
            tagger: OperatorTagger::new(),
            aggregator: ResultAggregator::new(),
            config,
        }
    }

    /// Use `clock` for status timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.aggregator = ResultAggregator::with_clock(clock);
        self
    }

    /// Configuration accessor.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Judge a proposed write and answer the hook framework.
    pub async fn evaluate<R: GatedResource>(&self, request: &AdmissionRequest<R>) -> Decision {
        match self.admit(request).await {
            Ok(()) => Decision::allow(),
            Err(err) => {
                if err.is_probe_failure() {
                    debug!(operation = %request.operation, "Denied after privilege probe failure");
                } else if err.is_internal() {
                    warn!(
                        operation = %request.operation,
                        caller = %request.caller,
                        error = %err,
                        "Approval gate internal error"
                    );
                } else {
                    info!(
                        operation = %request.operation,
                        caller = %request.caller,
                        reason = %err,
                        "Approval change denied"
                    );
                }
                Decision::deny(err.to_string())
            }
        }
    }

    /// Like [`ApprovalGate::evaluate`], but surfaces the typed error.
    pub async fn admit<R: GatedResource>(&self, request: &AdmissionRequest<R>) -> GateResult<()> {
        if !request.operation.is_create_or_update() {
            debug!(operation = %request.operation, "Operation passes through unexamined");
            return Ok(());
        }
        if !supports(R::CAPABILITIES, Capability::ValidateApprovals) {
            debug!("Resource does not declare approval validation");
            return Ok(());
        }

        let represent_others = self
            .probe_privilege(&request.caller, request.new.namespace())
            .await?;
        let caller = CallerContext {
            identity: request.caller.clone(),
            represent_others,
        };

        let gates = pair_gates(&request.new)?;
        let old_checks = request.old.as_ref().map(|old| old.approval_checks());
        // The recorded trigger is authoritative; the proposal may have edited it.
        let triggered_by = match &request.old {
            Some(old) => old.triggered_by(),
            None => request.new.triggered_by(),
        };
        let is_create = request.operation == Operation::Create;

        for (index, (check, spec)) in gates.into_iter().enumerate() {
            debug!(gate = %check.name, index, "Validating approval list");
            let validation = ValidationRequest {
                old: previous_approvals(old_checks, index),
                new: &check.approvals,
                spec,
                caller: &caller,
                is_create,
                triggered_by,
            };
            self.validator.validate(&validation)?;
        }

        if represent_others {
            debug!(caller = %request.caller, "Privileged caller, change allowed");
            return Ok(());
        }

        if let Some(old) = &request.old {
            if request.new.modified_outside_approvals(old) {
                return Err(GateError::ModifiedOutsideApprovals {
                    caller: request.caller.username.clone(),
                });
            }
        }

        Ok(())
    }

    /// Write path: the proposed resource with operators stamped onto every
    /// newly delegated decision.
    pub fn mutate<R: GatedResource>(&self, request: &AdmissionRequest<R>) -> R {
        if !request.operation.is_create_or_update()
            || !supports(R::CAPABILITIES, Capability::TagOperators)
        {
            return request.new.clone();
        }

        let old_checks = request.old.as_ref().map(|old| old.approval_checks());
        let checks = request
            .new
            .approval_checks()
            .iter()
            .enumerate()
            .map(|(index, check)| ApprovalCheck {
                name: check.name.clone(),
                approvals: self.tagger.tag(
                    request.operation,
                    previous_approvals(old_checks, index),
                    &check.approvals,
                    &request.caller,
                ),
            })
            .collect();

        request.new.with_approval_checks(checks)
    }

    /// Read path: aggregate every gate of `resource` against its prior
    /// status (paired by index).
    pub fn compute_status<R: GatedResource>(
        &self,
        resource: &R,
        prior: &[ApprovalCheckStatus],
    ) -> GateResult<Vec<AggregateOutcome>> {
        if !supports(R::CAPABILITIES, Capability::AggregateStatus) {
            return Ok(Vec::new());
        }

        let outcomes = pair_gates(resource)?
            .into_iter()
            .enumerate()
            .map(|(index, (check, spec))| {
                self.aggregator
                    .aggregate(spec, &check.approvals, prior.get(index))
            })
            .collect();
        Ok(outcomes)
    }

    /// Resource-level verdict over [`ApprovalGate::compute_status`].
    pub fn summarize<R: GatedResource>(
        &self,
        resource: &R,
        prior: &[ApprovalCheckStatus],
    ) -> GateResult<GateSummary> {
        Ok(GateSummary::from_outcomes(
            &self.compute_status(resource, prior)?,
        ))
    }

    async fn probe_privilege(
        &self,
        caller: &CallerIdentity,
        namespace: Option<&str>,
    ) -> GateResult<bool> {
        let probe = self.probe.can_represent_others(caller, namespace);
        let result = match self.config.probe_timeout() {
            Some(limit) => match tokio::time::timeout(limit, probe).await {
                Ok(result) => result,
                Err(_) => Err(GateError::ProbeTimeout(
                    self.config.probe_timeout_ms.unwrap_or_default(),
                )),
            },
            None => probe.await,
        };

        if let Err(err) = &result {
            warn!(caller = %caller, error = %err, "Privilege probe failed");
        }
        result
    }
}

/// Pair each check with its spec by index.
fn pair_gates<R: GatedResource>(
    resource: &R,
) -> GateResult<Vec<(&ApprovalCheck, Option<&ApprovalSpec>)>> {
    let checks = resource.approval_checks();
    match resource.approval_specs() {
        None => Ok(checks.iter().map(|check| (check, None)).collect()),
        Some(specs) if specs.len() != checks.len() => {
            warn!(
                checks = checks.len(),
                specs = specs.len(),
                "Approval checks and specs are out of step"
            );
            Err(GateError::StructuralMismatch {
                checks: checks.len(),
                specs: specs.len(),
            })
        }
        Some(specs) => Ok(checks.iter().zip(specs.iter().map(Some)).collect()),
    }
}

fn previous_approvals(old_checks: Option<&[ApprovalCheck]>, index: usize) -> &[UserApproval] {
    old_checks
        .and_then(|checks| checks.get(index))
        .map(|check| check.approvals.as_slice())
        .unwrap_or(&[])
}
