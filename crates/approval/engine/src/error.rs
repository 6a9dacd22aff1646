use approval_types::RejectionReason;
use thiserror::Error;

/// Errors from the Approval Gate engine.
#[derive(Error, Debug)]
pub enum GateError {
    /// A proposed approval list broke a policy rule
    #[error("{0}")]
    Rejected(#[from] RejectionReason),

    #[error("internal error #check != #checkSpec")]
    StructuralMismatch { checks: usize, specs: usize },

    #[error("\"{caller}\" can not modify fields other than the approval list")]
    ModifiedOutsideApprovals { caller: String },

    #[error("failed to check the represent-others privilege: {0}")]
    Probe(String),

    #[error("privilege probe timed out after {0}ms")]
    ProbeTimeout(u64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
}

impl GateError {
    /// Internal errors mean the engine's inputs were inconsistent; they are
    /// never expected outcomes of a user action.
    pub fn is_internal(&self) -> bool {
        match self {
            GateError::Rejected(reason) => reason.is_internal(),
            GateError::StructuralMismatch { .. } => true,
            _ => false,
        }
    }

    /// Failures of the privilege probe, already logged where they occur
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, GateError::Probe(_) | GateError::ProbeTimeout(_))
    }

    /// The rejection reason, for policy violations
    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            GateError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for GateError {
    fn from(err: config::ConfigError) -> Self {
        GateError::Config(err.to_string())
    }
}

pub type GateResult<T> = Result<T, GateError>;
