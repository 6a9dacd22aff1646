//! Caller identity and the identity that triggered a gated operation

use crate::{Subject, SubjectKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SERVICE_ACCOUNT_PREFIX: &str = "system:serviceaccount:";

/// The authenticated caller of a proposed write, as supplied by the hook framework
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    pub username: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl CallerIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// `(namespace, name)` when the username is a service-account username
    fn service_account(&self) -> Option<(&str, &str)> {
        self.username
            .strip_prefix(SERVICE_ACCOUNT_PREFIX)?
            .split_once(':')
    }

    /// Whether this caller *is* `subject`.
    pub fn matches(&self, subject: &Subject) -> bool {
        match subject.kind {
            SubjectKind::User => self.username == subject.name,
            SubjectKind::Group => self.groups.iter().any(|g| g == &subject.name),
            SubjectKind::ServiceAccount => match self.service_account() {
                Some((namespace, name)) => {
                    name == subject.name && subject.namespace.as_deref() == Some(namespace)
                }
                None => false,
            },
        }
    }

    /// The caller expressed as a subject, used to stamp operators.
    pub fn as_subject(&self) -> Subject {
        match self.service_account() {
            Some((namespace, name)) => Subject::service_account(namespace, name),
            None => Subject::user(self.username.clone()),
        }
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// Whoever initiated the gated operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredBy {
    pub user: Subject,
    pub triggered_timestamp: DateTime<Utc>,
}

impl TriggeredBy {
    pub fn new(user: Subject) -> Self {
        Self {
            user,
            triggered_timestamp: Utc::now(),
        }
    }
}
