//! Operator Tagger: records who really submitted each new decision

use approval_types::{CallerIdentity, Operation, UserApproval};
use tracing::debug;

use crate::diff::{index_by_subject, is_newly_decided};

/// Pre-commit transform stamping `operator` onto delegated decisions
#[derive(Clone, Copy, Debug, Default)]
pub struct OperatorTagger;

impl OperatorTagger {
    pub fn new() -> Self {
        Self
    }

    /// Return `new` with provenance applied to every newly decided entry.
    ///
    /// A decision submitted by someone other than its subject gets
    /// `operator = caller`; a decision the subject submitted for themselves
    /// loses any stale operator. Everything else is returned as is, and
    /// operations other than create/update leave the list untouched.
    pub fn tag(
        &self,
        operation: Operation,
        old: &[UserApproval],
        new: &[UserApproval],
        caller: &CallerIdentity,
    ) -> Vec<UserApproval> {
        if !operation.is_create_or_update() {
            return new.to_vec();
        }

        let previous = index_by_subject(old);
        new.iter()
            .map(|entry| {
                if !is_newly_decided(entry, &previous) {
                    return entry.clone();
                }
                let mut tagged = entry.clone();
                if caller.matches(&entry.subject) {
                    tagged.operator = None;
                } else {
                    let operator = caller.as_subject();
                    debug!(
                        subject = %entry.subject,
                        operator = %operator,
                        "Tagging delegated decision"
                    );
                    tagged.operator = Some(operator);
                }
                tagged
            })
            .collect()
    }
}
