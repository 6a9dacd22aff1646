use async_trait::async_trait;
use approval_types::{ApprovalCheck, ApprovalSpec, CallerIdentity, TriggeredBy};
use chrono::{DateTime, Utc};

use crate::capability::Capability;
use crate::error::GateError;

/// Identity/authorization probe for the "represent others" privilege.
///
/// `Ok(false)` means the caller simply lacks the privilege; `Err` means the
/// probe itself failed and the write must be denied.
#[async_trait]
pub trait PrivilegeProbe: Send + Sync {
    async fn can_represent_others(
        &self,
        caller: &CallerIdentity,
        namespace: Option<&str>,
    ) -> Result<bool, GateError>;
}

/// A resource carrying one or more approval gates.
///
/// Checks and specs are paired by index.
pub trait GatedResource: Clone + Send + Sync {
    /// Engine capabilities this resource type supports
    const CAPABILITIES: &'static [Capability] = Capability::ALL;

    fn namespace(&self) -> Option<&str>;

    fn approval_checks(&self) -> &[ApprovalCheck];

    /// `None` while the controlling configuration has not produced specs yet
    fn approval_specs(&self) -> Option<&[ApprovalSpec]>;

    fn triggered_by(&self) -> Option<&TriggeredBy>;

    /// Whether anything other than the approval lists differs from `old`
    fn modified_outside_approvals(&self, old: &Self) -> bool;

    /// A copy of this resource with its approval checks replaced
    fn with_approval_checks(&self, checks: Vec<ApprovalCheck>) -> Self;
}

/// Source of the current time for status timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
