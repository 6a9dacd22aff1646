//! Identity references used as approvers, operators and triggerers

use serde::{Deserialize, Serialize};

/// The kind of identity a [`Subject`] refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectKind::User => write!(f, "User"),
            SubjectKind::Group => write!(f, "Group"),
            SubjectKind::ServiceAccount => write!(f, "ServiceAccount"),
        }
    }
}

/// An identity reference. Equality is structural over kind, name and namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub kind: SubjectKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Subject {
    pub fn new(kind: SubjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: None,
        }
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self::new(SubjectKind::User, name)
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(SubjectKind::Group, name)
    }

    pub fn service_account(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(SubjectKind::ServiceAccount, name).with_namespace(namespace)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Subjects render as their bare name; that is what user-facing messages quote.
impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
