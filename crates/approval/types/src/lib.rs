//! Approval Gate Domain Types
//!
//! This crate defines the records an approval gate reads and writes:
//! who may decide, what they decided, and what the engine remembered
//! about those decisions.
//!
//! # Key Concepts
//!
//! - **Subject**: an identity reference (user, group or service account).
//! - **ApprovalSpec**: the policy of one gate (`Any`, `All`, `InOrder`) and
//!   its eligible approvers.
//! - **ApprovalCheck**: the mutable list of per-subject decisions attached to
//!   the gated resource.
//! - **ApprovalCheckStatus**: the engine's memo of recorded decisions, with
//!   the time each decision was first seen.
//!
//! # Architecture
//!
//! This is a pure types crate with no runtime dependencies. All records
//! implement `Clone`, `Debug`, `Serialize`, `Deserialize` and use camelCase
//! field names on the wire.

#![deny(unsafe_code)]

mod approval;
mod identity;
mod operation;
mod policy;
mod rejection;
mod status;
mod subject;

pub use approval::*;
pub use identity::*;
pub use operation::*;
pub use policy::*;
pub use rejection::*;
pub use status::*;
pub use subject::*;
