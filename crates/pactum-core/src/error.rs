//! Contract violation and error types.
//!
//! Uses `thiserror` for structured, matchable errors. A [`Violation`] is a
//! failed runtime check; its `Display` is the exact diagnostic message.
//! [`ContractError`] is what a wrapped operation returns when it does not
//! produce a value.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// A precondition over the call arguments.
    Precondition,
    /// A postcondition over the result and arguments.
    Postcondition,
    /// The invariant, checked before the operation ran.
    InvariantBefore,
    /// The invariant, checked after the operation ran.
    InvariantAfter,
    /// The invariant, checked once after construction.
    InvariantAtConstruction,
}

/// Diagnostic label for a failed check, distinguishing accessor failures
/// from method failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Before,
    After,
    ConstantBefore,
    ConstantAfter,
    SetterBefore,
    SetterAfter,
    ConstantConstructor,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Before => "before",
            FailureKind::After => "after",
            FailureKind::ConstantBefore => "constant-before",
            FailureKind::ConstantAfter => "constant-after",
            FailureKind::SetterBefore => "setter-before",
            FailureKind::SetterAfter => "setter-after",
            FailureKind::ConstantConstructor => "constant-constructor",
        }
    }

    pub fn violation_kind(self) -> ViolationKind {
        match self {
            FailureKind::Before | FailureKind::SetterBefore => ViolationKind::Precondition,
            FailureKind::After | FailureKind::SetterAfter => ViolationKind::Postcondition,
            FailureKind::ConstantBefore => ViolationKind::InvariantBefore,
            FailureKind::ConstantAfter => ViolationKind::InvariantAfter,
            FailureKind::ConstantConstructor => ViolationKind::InvariantAtConstruction,
        }
    }

    /// Leading text of the diagnostic message.
    pub fn headline(self) -> &'static str {
        match self {
            FailureKind::Before | FailureKind::SetterBefore => "Before failed",
            FailureKind::After | FailureKind::SetterAfter => "After failed",
            FailureKind::ConstantBefore => "Constant failed before",
            FailureKind::ConstantAfter => "Constant failed after",
            FailureKind::ConstantConstructor => "Constant failed after constructor",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed contract check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct Violation {
    /// Which check failed, in diagnostic vocabulary.
    pub failure: FailureKind,
    /// Class label of the receiver.
    pub class: String,
    /// Member name. `None` for construction checks.
    pub member: Option<String>,
    /// Full diagnostic message, e.g. `Before failed: Person.set age(-1)`.
    pub message: String,
}

impl Violation {
    /// Builds a violation whose message is `<headline>: <subject>`.
    pub fn new(
        failure: FailureKind,
        class: impl Into<String>,
        member: Option<String>,
        subject: &str,
    ) -> Self {
        Violation {
            failure,
            class: class.into(),
            member,
            message: format!("{}: {subject}", failure.headline()),
        }
    }

    pub fn kind(&self) -> ViolationKind {
        self.failure.violation_kind()
    }
}

/// Errors surfaced by wrapped operations and contract construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    /// A check failed in `throw` mode.
    #[error(transparent)]
    Violation(#[from] Violation),

    /// The contract itself is misconfigured. Always fatal, whatever the
    /// failure mode.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// The wrapped operation failed on its own.
    #[error("{message}")]
    Operation { message: String },
}

impl ContractError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        ContractError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn operation(message: impl Into<String>) -> Self {
        ContractError::Operation {
            message: message.into(),
        }
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            ContractError::Violation(violation) => Some(violation),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ContractError::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_display_is_the_message() {
        let violation = Violation::new(
            FailureKind::ConstantAfter,
            "Counter",
            Some("dec".into()),
            "Counter.dec(2) -> -1",
        );
        assert_eq!(violation.to_string(), "Constant failed after: Counter.dec(2) -> -1");
        assert_eq!(violation.kind(), ViolationKind::InvariantAfter);

        let err = ContractError::from(violation);
        assert_eq!(err.to_string(), "Constant failed after: Counter.dec(2) -> -1");
        assert!(err.violation().is_some());
    }

    #[test]
    fn setter_failures_share_method_headlines() {
        assert_eq!(FailureKind::SetterBefore.headline(), FailureKind::Before.headline());
        assert_eq!(FailureKind::SetterAfter.violation_kind(), ViolationKind::Postcondition);
    }

    #[test]
    fn failure_kinds_serialize_kebab_case() {
        let json = serde_json::to_string(&FailureKind::ConstantConstructor).unwrap();
        assert_eq!(json, "\"constant-constructor\"");
        assert_eq!(FailureKind::SetterAfter.to_string(), "setter-after");
    }

    #[test]
    fn configuration_errors_are_distinguishable() {
        let err = ContractError::configuration("class contract requires an invariant");
        assert!(err.is_configuration());
        assert!(err.violation().is_none());
        assert_eq!(
            err.to_string(),
            "configuration error: class contract requires an invariant"
        );
    }
}
