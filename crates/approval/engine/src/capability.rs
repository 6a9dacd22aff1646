//! Statically declared engine capabilities of a gated resource type
//!
//! Resource types list what the engine may do with them through
//! [`crate::traits::GatedResource::CAPABILITIES`]; the gate consults that list
//! rather than probing the type at runtime.

use serde::{Deserialize, Serialize};

/// One thing the engine can do for a gated resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Run the Diff Validator on admission
    ValidateApprovals,
    /// Stamp operators onto delegated decisions before commit
    TagOperators,
    /// Compute gate verdicts and status snapshots
    AggregateStatus,
}

impl Capability {
    pub const ALL: &'static [Capability] = &[
        Capability::ValidateApprovals,
        Capability::TagOperators,
        Capability::AggregateStatus,
    ];
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::ValidateApprovals => write!(f, "validate-approvals"),
            Capability::TagOperators => write!(f, "tag-operators"),
            Capability::AggregateStatus => write!(f, "aggregate-status"),
        }
    }
}

/// Whether `declared` includes `capability`
pub fn supports(declared: &[Capability], capability: Capability) -> bool {
    declared.contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_every_capability() {
        assert!(supports(Capability::ALL, Capability::ValidateApprovals));
        assert!(supports(Capability::ALL, Capability::TagOperators));
        assert!(supports(Capability::ALL, Capability::AggregateStatus));
        assert!(!supports(&[Capability::AggregateStatus], Capability::TagOperators));
    }
}
