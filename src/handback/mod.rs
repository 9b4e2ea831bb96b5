//! The handback validation gate.
//!
//! An agent receives a [`WorkOrder`] and answers with an [`OutcomeReport`].
//! [`validate_handback`] runs six independent checks over the pair, applies
//! the [`HandbackConfig`] policy, and returns a [`ValidationResult`] that says
//! whether the work is accepted and where the task should go next.

pub mod checks;
pub mod codec;
pub mod gate;
pub mod policy;
pub mod types;

pub use checks::{CheckResult, CheckStatus, ScopeViolation, ViolationKind};
pub use codec::{decode, encode, CodecError, Record};
pub use gate::{validate_handback, NextStatus, ValidationResult};
pub use policy::HandbackConfig;
pub use types::{
    ChangeKind, Confidence, DiscoveredIssue, FileAction, FileChange, FileReference, IssueKind,
    OutcomeReport, OutcomeStatus, TestFailure, TestResult, WorkOrder,
};
