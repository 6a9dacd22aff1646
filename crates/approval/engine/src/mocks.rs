use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use approval_types::{ApprovalCheck, ApprovalSpec, CallerIdentity, TriggeredBy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::traits::{Clock, GatedResource, PrivilegeProbe};

/// Mock privilege probe for testing.
///
/// Grants the represent-others privilege to a fixed set of usernames.
pub struct StaticPrivilegeProbe {
    privileged: HashSet<String>,
    everyone: bool,
}

impl StaticPrivilegeProbe {
    /// Create a probe that grants the privilege to every caller.
    pub fn allow_all() -> Self {
        Self {
            privileged: HashSet::new(),
            everyone: true,
        }
    }

    /// Create a probe that grants the privilege to nobody.
    pub fn deny_all() -> Self {
        Self {
            privileged: HashSet::new(),
            everyone: false,
        }
    }

    /// Grant the privilege to `username`.
    pub fn with_privileged(mut self, username: impl Into<String>) -> Self {
        self.privileged.insert(username.into());
        self
    }
}

#[async_trait]
impl PrivilegeProbe for StaticPrivilegeProbe {
    async fn can_represent_others(
        &self,
        caller: &CallerIdentity,
        _namespace: Option<&str>,
    ) -> Result<bool, GateError> {
        Ok(self.everyone || self.privileged.contains(&caller.username))
    }
}

/// Mock probe whose every call fails.
pub struct FailingPrivilegeProbe {
    message: String,
}

impl FailingPrivilegeProbe {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl PrivilegeProbe for FailingPrivilegeProbe {
    async fn can_represent_others(
        &self,
        _caller: &CallerIdentity,
        _namespace: Option<&str>,
    ) -> Result<bool, GateError> {
        Err(GateError::Probe(self.message.clone()))
    }
}

/// Mock probe that answers `true` after a delay.
pub struct DelayedPrivilegeProbe {
    delay: Duration,
}

impl DelayedPrivilegeProbe {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PrivilegeProbe for DelayedPrivilegeProbe {
    async fn can_represent_others(
        &self,
        _caller: &CallerIdentity,
        _namespace: Option<&str>,
    ) -> Result<bool, GateError> {
        tokio::time::sleep(self.delay).await;
        Ok(true)
    }
}

/// Clock frozen at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at_rfc3339(time: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self(DateTime::parse_from_rfc3339(time)?.with_timezone(&Utc)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Mock gated resource: a pipeline stage run awaiting sign-off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MockStageRun {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Everything that is not approval state
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs: Option<Vec<ApprovalSpec>>,
    #[serde(default)]
    pub checks: Vec<ApprovalCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<TriggeredBy>,
}

impl MockStageRun {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }

    /// Add a gate: its spec and a check of undecided placeholders for its approvers.
    pub fn with_gate(mut self, spec: ApprovalSpec) -> Self {
        let approvals = spec
            .eligible_approvers
            .iter()
            .cloned()
            .map(approval_types::UserApproval::pending)
            .collect();
        self.checks.push(ApprovalCheck::new(spec.name.clone(), approvals));
        self.specs.get_or_insert_with(Vec::new).push(spec);
        self
    }

    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        if !self.params.is_object() {
            self.params = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(params) = self.params.as_object_mut() {
            params.insert(key.to_string(), value);
        }
        self
    }

    pub fn with_triggered_by(mut self, triggered_by: TriggeredBy) -> Self {
        self.triggered_by = Some(triggered_by);
        self
    }
}

impl GatedResource for MockStageRun {
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn approval_checks(&self) -> &[ApprovalCheck] {
        &self.checks
    }

    fn approval_specs(&self) -> Option<&[ApprovalSpec]> {
        self.specs.as_deref()
    }

    fn triggered_by(&self) -> Option<&TriggeredBy> {
        self.triggered_by.as_ref()
    }

    fn modified_outside_approvals(&self, old: &Self) -> bool {
        self.namespace != old.namespace
            || self.params != old.params
            || self.specs != old.specs
            || self.triggered_by != old.triggered_by
    }

    fn with_approval_checks(&self, checks: Vec<ApprovalCheck>) -> Self {
        Self {
            checks,
            ..self.clone()
        }
    }
}
