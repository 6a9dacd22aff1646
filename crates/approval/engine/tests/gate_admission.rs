//! End-to-end admission flows through the approval gate.

use std::sync::Arc;
use std::time::Duration;

use approval_engine::{
    AdmissionRequest, ApprovalGate, Capability, DelayedPrivilegeProbe, FixedClock, GateConfig,
    GateError, GateVerdict, GatedResource, MockStageRun, StaticPrivilegeProbe,
};
use approval_types::{
    ApprovalCheck, ApprovalPolicy, ApprovalSpec, CallerIdentity, Operation, RejectionReason,
    Subject, TriggeredBy, UserApproval, UserApprovalInput,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn setup_gate(probe: StaticPrivilegeProbe) -> ApprovalGate {
    ApprovalGate::new(Arc::new(probe), GateConfig::default()).with_clock(Arc::new(
        FixedClock::at_rfc3339("2024-05-01T10:00:00Z").unwrap(),
    ))
}

fn in_order_run() -> MockStageRun {
    MockStageRun::new("dev")
        .with_param("image", serde_json::json!("app:1"))
        .with_gate(
            ApprovalSpec::new(ApprovalPolicy::InOrder)
                .with_name("release")
                .with_approvers([Subject::user("alice"), Subject::user("bob")]),
        )
}

fn set_input(run: &MockStageRun, gate: usize, name: &str, approved: bool) -> MockStageRun {
    let mut next = run.clone();
    if let Some(entry) = next.checks[gate]
        .approvals
        .iter_mut()
        .find(|a| a.subject == Subject::user(name))
    {
        entry.input = Some(UserApprovalInput { approved });
    }
    next
}

/// Validate, tag, and hand back what the store would commit.
async fn submit(
    gate: &ApprovalGate,
    old: &MockStageRun,
    new: MockStageRun,
    caller: &str,
) -> Result<MockStageRun, GateError> {
    let request = AdmissionRequest::update(old.clone(), new, CallerIdentity::new(caller));
    gate.admit(&request).await?;
    Ok(gate.mutate(&request))
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn in_order_gate_walks_through_its_approvers() {
    let gate = setup_gate(StaticPrivilegeProbe::deny_all());
    let run = in_order_run();

    // bob cannot go first
    let early = submit(&gate, &run, set_input(&run, 0, "bob", true), "bob")
        .await
        .unwrap_err();
    assert_eq!(
        early.to_string(),
        "Approval policy is \"InOrder\", \"bob\" can not approve before \"alice\"."
    );

    let after_alice = submit(&gate, &run, set_input(&run, 0, "alice", true), "alice")
        .await
        .unwrap();
    assert_eq!(
        gate.summarize(&after_alice, &[]).unwrap().verdict,
        GateVerdict::Pending
    );

    let after_bob = submit(
        &gate,
        &after_alice,
        set_input(&after_alice, 0, "bob", true),
        "bob",
    )
    .await
    .unwrap();
    let outcomes = gate.compute_status(&after_bob, &[]).unwrap();
    assert!(outcomes[0].approved);
    assert_eq!(
        outcomes[0].message,
        "Approved by \"alice\" on 2024-05-01T10:00:00Z, \"bob\" on 2024-05-01T10:00:00Z"
    );
}

#[tokio::test]
async fn recorded_decision_cannot_be_flipped() {
    let gate = setup_gate(StaticPrivilegeProbe::allow_all());
    let run = set_input(&in_order_run(), 0, "alice", true);

    let err = submit(&gate, &run, set_input(&run, 0, "alice", false), "alice")
        .await
        .unwrap_err();
    assert!(matches!(
        err.rejection(),
        Some(RejectionReason::ResultChanged { .. })
    ));
}

#[tokio::test]
async fn unprivileged_caller_cannot_touch_other_fields() {
    let gate = setup_gate(StaticPrivilegeProbe::deny_all());
    let run = in_order_run();
    let tampered =
        set_input(&run, 0, "alice", true).with_param("image", serde_json::json!("evil:1"));

    let decision = gate
        .evaluate(&AdmissionRequest::update(
            run.clone(),
            tampered.clone(),
            CallerIdentity::new("alice"),
        ))
        .await;
    assert!(!decision.allowed);
    assert_eq!(
        decision.reason,
        "\"alice\" can not modify fields other than the approval list"
    );

    let privileged = setup_gate(StaticPrivilegeProbe::deny_all().with_privileged("alice"));
    let decision = privileged
        .evaluate(&AdmissionRequest::update(
            run,
            tampered,
            CallerIdentity::new("alice"),
        ))
        .await;
    assert!(decision.allowed, "{}", decision.reason);
}

#[tokio::test]
async fn trigger_cannot_approve_own_run() {
    let gate = setup_gate(StaticPrivilegeProbe::allow_all());
    let run = MockStageRun::new("dev")
        .with_gate(
            ApprovalSpec::new(ApprovalPolicy::Any)
                .with_name("deploy")
                .with_approvers([Subject::user("alice"), Subject::user("bob")])
                .requiring_different_approver(),
        )
        .with_triggered_by(TriggeredBy::new(Subject::user("alice")));

    let err = submit(&gate, &run, set_input(&run, 0, "alice", true), "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "requiresDifferentApprover is enabled, \"alice\" can not approve."
    );

    // erasing the trigger in the proposal does not help
    let mut sneaky = set_input(&run, 0, "alice", true);
    sneaky.triggered_by = None;
    assert!(submit(&gate, &run, sneaky, "alice").await.is_err());

    assert!(submit(&gate, &run, set_input(&run, 0, "bob", true), "bob")
        .await
        .is_ok());
}

#[tokio::test]
async fn create_with_placeholders_and_missing_specs() {
    let gate = setup_gate(StaticPrivilegeProbe::deny_all());

    let seeded = in_order_run();
    let decision = gate
        .evaluate(&AdmissionRequest::create(seeded, CallerIdentity::new("ci")))
        .await;
    assert!(decision.allowed, "{}", decision.reason);

    let mut unscheduled = MockStageRun::new("dev");
    unscheduled.checks.push(ApprovalCheck::new(
        "release",
        vec![UserApproval::pending(Subject::user("alice"))],
    ));
    let create = AdmissionRequest::create(unscheduled.clone(), CallerIdentity::new("ci"));
    assert!(gate.evaluate(&create).await.allowed);

    let update = AdmissionRequest::update(
        unscheduled.clone(),
        unscheduled,
        CallerIdentity::new("ci"),
    );
    let decision = gate.evaluate(&update).await;
    assert!(!decision.allowed);
    assert_eq!(decision.reason, "internal error: approval spec is missing");
}

#[tokio::test]
async fn duplicate_on_create_is_rejected() {
    let gate = setup_gate(StaticPrivilegeProbe::allow_all());
    let mut run = in_order_run();
    run.checks[0]
        .approvals
        .push(UserApproval::pending(Subject::user("alice")));

    let decision = gate
        .evaluate(&AdmissionRequest::create(run, CallerIdentity::new("ci")))
        .await;
    assert_eq!(decision.reason, "approver \"alice\" cannot be repeated");
}

#[tokio::test(start_paused = true)]
async fn slow_probe_is_bounded_by_configured_timeout() {
    let config = GateConfig {
        probe_timeout_ms: Some(50),
        ..GateConfig::default()
    };
    let gate = ApprovalGate::new(
        Arc::new(DelayedPrivilegeProbe::new(Duration::from_secs(5))),
        config,
    );
    let run = in_order_run();
    let request = AdmissionRequest::update(
        run.clone(),
        set_input(&run, 0, "alice", true),
        CallerIdentity::new("alice"),
    );

    let err = gate.admit(&request).await.unwrap_err();
    assert!(matches!(err, GateError::ProbeTimeout(50)));
    assert!(!gate.evaluate(&request).await.allowed);
}

#[tokio::test]
async fn connect_operation_is_not_examined() {
    let gate = setup_gate(StaticPrivilegeProbe::deny_all());
    let run = in_order_run();
    let request = AdmissionRequest::update(
        run.clone(),
        set_input(&run, 0, "bob", true),
        CallerIdentity::new("mallory"),
    )
    .with_operation(Operation::Connect);
    assert!(gate.evaluate(&request).await.allowed);
    assert_eq!(gate.mutate(&request), request.new);
}

// ---------------------------------------------------------------------------
// Write and read paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delegated_then_self_submission_provenance() {
    let gate = setup_gate(StaticPrivilegeProbe::deny_all().with_privileged("admin"));
    let run = MockStageRun::new("dev").with_gate(
        ApprovalSpec::new(ApprovalPolicy::All)
            .with_name("release")
            .with_approvers([Subject::user("user"), Subject::user("admin")]),
    );

    let delegated = submit(&gate, &run, set_input(&run, 0, "user", true), "admin")
        .await
        .unwrap();
    let user_entry = delegated.checks[0].find(&Subject::user("user")).unwrap();
    assert_eq!(user_entry.operator, Some(Subject::user("admin")));

    let first = gate.compute_status(&delegated, &[]).unwrap();
    assert_eq!(
        first[0].status.approvals[0].operator,
        Some(Subject::user("admin"))
    );
    assert_eq!(first[0].verdict(), GateVerdict::Pending);

    // a later round where the subject submits for themself clears the stamp
    let mut stale = run.clone();
    stale.checks[0].approvals[0].operator = Some(Subject::user("admin"));
    let own = submit(&gate, &stale, set_input(&stale, 0, "user", true), "user")
        .await
        .unwrap();
    assert_eq!(own.checks[0].approvals[0].operator, None);
}

#[tokio::test]
async fn recorded_operator_is_fixed_for_unprivileged_callers() {
    let gate = setup_gate(StaticPrivilegeProbe::deny_all().with_privileged("admin"));
    let run = MockStageRun::new("dev").with_gate(
        ApprovalSpec::new(ApprovalPolicy::All)
            .with_name("release")
            .with_approvers([Subject::user("user"), Subject::user("bob")]),
    );
    let delegated = submit(&gate, &run, set_input(&run, 0, "user", true), "admin")
        .await
        .unwrap();

    let mut forged = set_input(&delegated, 0, "bob", true);
    forged.checks[0].approvals[0].operator = Some(Subject::user("mallory"));
    let decision = gate
        .evaluate(&AdmissionRequest::update(
            delegated.clone(),
            forged,
            CallerIdentity::new("bob"),
        ))
        .await;
    assert!(!decision.allowed);
    assert_eq!(
        decision.reason,
        "\"bob\" can not change the operator recorded for \"user\""
    );

    let honest = submit(&gate, &delegated, set_input(&delegated, 0, "bob", true), "bob")
        .await
        .unwrap();
    assert_eq!(
        honest.checks[0].approvals[0].operator,
        Some(Subject::user("admin"))
    );
}

#[tokio::test]
async fn status_is_stable_across_reevaluation() {
    let gate = setup_gate(StaticPrivilegeProbe::deny_all());
    let run = set_input(&in_order_run(), 0, "alice", true);

    let first = gate.compute_status(&run, &[]).unwrap();
    let prior: Vec<_> = first.iter().map(|o| o.status.clone()).collect();

    let later = ApprovalGate::new(
        Arc::new(StaticPrivilegeProbe::deny_all()),
        GateConfig::default(),
    )
    .with_clock(Arc::new(
        FixedClock::at_rfc3339("2030-01-01T00:00:00Z").unwrap(),
    ));
    let second = later.compute_status(&run, &prior).unwrap();
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Capability registry
// ---------------------------------------------------------------------------

/// A resource type that only wants verdicts computed, never admission checks.
#[derive(Clone, Debug, PartialEq)]
struct ReportOnly(MockStageRun);

impl GatedResource for ReportOnly {
    const CAPABILITIES: &'static [Capability] = &[Capability::AggregateStatus];

    fn namespace(&self) -> Option<&str> {
        self.0.namespace()
    }

    fn approval_checks(&self) -> &[ApprovalCheck] {
        self.0.approval_checks()
    }

    fn approval_specs(&self) -> Option<&[ApprovalSpec]> {
        self.0.approval_specs()
    }

    fn triggered_by(&self) -> Option<&TriggeredBy> {
        self.0.triggered_by()
    }

    fn modified_outside_approvals(&self, old: &Self) -> bool {
        self.0.modified_outside_approvals(&old.0)
    }

    fn with_approval_checks(&self, checks: Vec<ApprovalCheck>) -> Self {
        Self(self.0.with_approval_checks(checks))
    }
}

#[tokio::test]
async fn undeclared_capabilities_are_skipped() {
    let gate = setup_gate(StaticPrivilegeProbe::deny_all());
    let run = in_order_run();
    let proxied = ReportOnly(set_input(&run, 0, "bob", true));
    let request = AdmissionRequest::update(
        ReportOnly(run),
        proxied.clone(),
        CallerIdentity::new("mallory"),
    );

    assert!(gate.evaluate(&request).await.allowed);
    assert_eq!(gate.mutate(&request), proxied);
    assert_eq!(gate.compute_status(&proxied, &[]).unwrap().len(), 1);
}
