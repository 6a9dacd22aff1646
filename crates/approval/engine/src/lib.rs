//! Approval Gate: policy-driven multi-party sign-off for gated resources.
//!
//! Every proposed write to a gated resource passes through the gate before
//! the resource store commits it. The gate answers two questions:
//!
//! - Is the proposed change to each approval list a legal move for this
//!   caller? ([`DiffValidator`])
//! - What is each gate's verdict now? ([`ResultAggregator`])
//!
//! ## Invariants
//!
//! - No subject appears twice on an approval list.
//! - A subject is never dropped from an approval list.
//! - A recorded decision never changes.
//! - Under `InOrder`, existing order holds and nobody decides ahead of an
//!   undecided predecessor.
//! - A decision's approval time is set once, when it is first recorded.
//!
//! ## Flow
//!
//! 1. **Privilege probe**: does the caller hold "represent others"?
//! 2. **Diff validation**: per gate, old list vs proposed list
//! 3. **Outside-approvals guard**: unprivileged callers may only touch approvals
//! 4. **Operator tagging**: delegated decisions record their real submitter
//! 5. **Aggregation**: verdicts and status snapshots on the read path

pub mod aggregator;
pub mod capability;
pub mod config;
pub mod context;
mod diff;
pub mod error;
pub mod gate;
pub mod mocks;
pub mod tagger;
pub mod telemetry;
pub mod traits;
pub mod validator;

pub use aggregator::{AggregateOutcome, GateSummary, GateVerdict, ResultAggregator};
pub use capability::Capability;
pub use config::{GateConfig, LoggingConfig};
pub use context::{AdmissionRequest, CallerContext, ValidationRequest};
pub use error::{GateError, GateResult};
pub use gate::ApprovalGate;
pub use mocks::{
    DelayedPrivilegeProbe, FailingPrivilegeProbe, FixedClock, MockStageRun, StaticPrivilegeProbe,
};
pub use tagger::OperatorTagger;
pub use telemetry::init_tracing;
pub use traits::{Clock, GatedResource, PrivilegeProbe, SystemClock};
pub use validator::DiffValidator;
