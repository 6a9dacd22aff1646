//! Helpers shared by the validator and the tagger for comparing two lists

use std::collections::HashMap;

use approval_types::{Subject, UserApproval};

/// Index of `old` by subject
pub(crate) fn index_by_subject(list: &[UserApproval]) -> HashMap<&Subject, &UserApproval> {
    list.iter().map(|a| (&a.subject, a)).collect()
}

/// Whether `entry` carries an input that `old` did not have for its subject
pub(crate) fn is_newly_decided(
    entry: &UserApproval,
    old: &HashMap<&Subject, &UserApproval>,
) -> bool {
    entry.input.is_some()
        && old
            .get(&entry.subject)
            .map_or(true, |previous| previous.input.is_none())
}
