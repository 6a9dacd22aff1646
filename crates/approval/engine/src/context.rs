use approval_types::{ApprovalSpec, CallerIdentity, Operation, TriggeredBy, UserApproval};

/// Who is proposing a change, and whether they may act for others.
///
/// Passed explicitly to every component instead of riding along in an
/// ambient request context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerContext {
    pub identity: CallerIdentity,
    /// Result of the "represent others" privilege probe
    pub represent_others: bool,
}

impl CallerContext {
    pub fn new(identity: CallerIdentity) -> Self {
        Self {
            identity,
            represent_others: false,
        }
    }

    pub fn privileged(identity: CallerIdentity) -> Self {
        Self {
            identity,
            represent_others: true,
        }
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }
}

/// Everything the Diff Validator needs to judge one gate's proposed list
#[derive(Clone, Copy, Debug)]
pub struct ValidationRequest<'a> {
    pub old: &'a [UserApproval],
    pub new: &'a [UserApproval],
    pub spec: Option<&'a ApprovalSpec>,
    pub caller: &'a CallerContext,
    pub is_create: bool,
    pub triggered_by: Option<&'a TriggeredBy>,
}

impl<'a> ValidationRequest<'a> {
    pub fn new(
        old: &'a [UserApproval],
        new: &'a [UserApproval],
        spec: Option<&'a ApprovalSpec>,
        caller: &'a CallerContext,
    ) -> Self {
        Self {
            old,
            new,
            spec,
            caller,
            is_create: false,
            triggered_by: None,
        }
    }

    pub fn creating(mut self) -> Self {
        self.is_create = true;
        self
    }

    pub fn triggered_by(mut self, triggered_by: Option<&'a TriggeredBy>) -> Self {
        self.triggered_by = triggered_by;
        self
    }
}

/// A proposed write on a gated resource, as delivered by the hook framework
#[derive(Clone, Debug)]
pub struct AdmissionRequest<R> {
    pub operation: Operation,
    /// Absent on create
    pub old: Option<R>,
    pub new: R,
    pub caller: CallerIdentity,
}

impl<R> AdmissionRequest<R> {
    pub fn create(new: R, caller: CallerIdentity) -> Self {
        Self {
            operation: Operation::Create,
            old: None,
            new,
            caller,
        }
    }

    pub fn update(old: R, new: R, caller: CallerIdentity) -> Self {
        Self {
            operation: Operation::Update,
            old: Some(old),
            new,
            caller,
        }
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }
}
