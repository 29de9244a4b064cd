//! Contract declarations and their resolution into a [`ContractSpec`].
//!
//! A declaration is either a bare invariant or a [`ContractRecord`] that may
//! use any of the recognized aliases (`requires` for `before`, `ensures` for
//! `after`, `invariant` for `constant`). Resolution picks the primary field
//! and consults the alias only when the primary is absent. Fields of the
//! wrong shape are dropped, never reported: a misspelled failure mode falls
//! back to the process-wide default.

use std::fmt;
use std::rc::Rc;

use pactum_core::{FailureMode, Value};

use crate::eventual::Check;
use crate::trace::TraceSetting;

/// Predicate over an argument list. Postconditions receive the result
/// followed by the arguments.
pub type Predicate = Rc<dyn Fn(&[Value]) -> Check>;

/// Predicate over the receiver.
pub type StatePredicate = Rc<dyn Fn(&Value) -> Check>;

/// Wraps a closure returning anything convertible into a [`Check`].
pub fn predicate<F, C>(f: F) -> Predicate
where
    F: Fn(&[Value]) -> C + 'static,
    C: Into<Check>,
{
    Rc::new(move |args: &[Value]| f(args).into())
}

/// Wraps a receiver closure returning anything convertible into a [`Check`].
pub fn state_predicate<F, C>(f: F) -> StatePredicate
where
    F: Fn(&Value) -> C + 'static,
    C: Into<Check>,
{
    Rc::new(move |this: &Value| f(this).into())
}

/// The resolved contract for one wrapped operation.
///
/// Built once and shared by every invocation; nothing in it changes after
/// resolution.
#[derive(Clone, Default)]
pub struct ContractSpec {
    precondition: Option<Predicate>,
    postcondition: Option<Predicate>,
    invariant: Option<StatePredicate>,
    trace: TraceSetting,
    failure_mode: Option<FailureMode>,
}

impl ContractSpec {
    pub fn precondition(&self) -> Option<&Predicate> {
        self.precondition.as_ref()
    }

    pub fn postcondition(&self) -> Option<&Predicate> {
        self.postcondition.as_ref()
    }

    pub fn invariant(&self) -> Option<&StatePredicate> {
        self.invariant.as_ref()
    }

    pub fn trace(&self) -> &TraceSetting {
        &self.trace
    }

    /// Per-contract override of the process-wide failure mode.
    pub fn failure_mode(&self) -> Option<FailureMode> {
        self.failure_mode
    }

    /// True when no check would run.
    pub fn is_empty(&self) -> bool {
        self.precondition.is_none() && self.postcondition.is_none() && self.invariant.is_none()
    }

    /// A copy keeping only the invariant, trace setting and failure mode.
    /// The invariant is shared, not cloned.
    pub fn invariant_only(&self) -> ContractSpec {
        ContractSpec {
            precondition: None,
            postcondition: None,
            invariant: self.invariant.clone(),
            trace: self.trace.clone(),
            failure_mode: self.failure_mode,
        }
    }
}

impl fmt::Debug for ContractSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractSpec")
            .field("precondition", &self.precondition.is_some())
            .field("postcondition", &self.postcondition.is_some())
            .field("invariant", &self.invariant.is_some())
            .field("trace", &self.trace)
            .field("failure_mode", &self.failure_mode)
            .finish()
    }
}

/// Raw, user-facing contract declaration with every alias.
#[derive(Clone, Default)]
pub struct ContractRecord {
    before: Option<Predicate>,
    requires: Option<Predicate>,
    after: Option<Predicate>,
    ensures: Option<Predicate>,
    constant: Option<StatePredicate>,
    invariant: Option<StatePredicate>,
    trace: Option<TraceSetting>,
    failure_mode: Option<String>,
}

impl ContractRecord {
    pub fn new() -> Self {
        ContractRecord::default()
    }

    /// Reads the non-callable options (`trace`, `failureMode`) from JSON.
    ///
    /// `trace` must be a boolean and `failureMode` a string; anything else,
    /// including unknown keys and non-object input, is ignored.
    pub fn from_options(options: &serde_json::Value) -> Self {
        let mut record = ContractRecord::default();
        let Some(map) = options.as_object() else {
            tracing::debug!("contract options are not an object; ignoring");
            return record;
        };
        for (key, value) in map {
            match (key.as_str(), value) {
                ("trace", serde_json::Value::Bool(enabled)) => {
                    record.trace = Some(TraceSetting::from(*enabled));
                }
                ("failureMode", serde_json::Value::String(mode)) => {
                    record.failure_mode = Some(mode.clone());
                }
                _ => tracing::debug!(option = %key, "dropping unrecognized contract option"),
            }
        }
        record
    }

    pub fn before<F, C>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> C + 'static,
        C: Into<Check>,
    {
        self.before = Some(predicate(f));
        self
    }

    pub fn requires<F, C>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> C + 'static,
        C: Into<Check>,
    {
        self.requires = Some(predicate(f));
        self
    }

    pub fn after<F, C>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> C + 'static,
        C: Into<Check>,
    {
        self.after = Some(predicate(f));
        self
    }

    pub fn ensures<F, C>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> C + 'static,
        C: Into<Check>,
    {
        self.ensures = Some(predicate(f));
        self
    }

    pub fn constant<F, C>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> C + 'static,
        C: Into<Check>,
    {
        self.constant = Some(state_predicate(f));
        self
    }

    pub fn invariant<F, C>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> C + 'static,
        C: Into<Check>,
    {
        self.invariant = Some(state_predicate(f));
        self
    }

    pub fn trace(mut self, trace: impl Into<TraceSetting>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Failure mode override, by name (`"log"` or `"throw"`).
    pub fn failure_mode(mut self, mode: impl ToString) -> Self {
        self.failure_mode = Some(mode.to_string());
        self
    }
}

/// A contract declaration as supplied by the user.
#[derive(Clone)]
pub enum Declaration {
    /// A bare callable, taken as the invariant.
    Invariant(StatePredicate),
    Record(ContractRecord),
}

impl Declaration {
    pub fn invariant<F, C>(f: F) -> Self
    where
        F: Fn(&Value) -> C + 'static,
        C: Into<Check>,
    {
        Declaration::Invariant(state_predicate(f))
    }
}

impl From<ContractRecord> for Declaration {
    fn from(record: ContractRecord) -> Self {
        Declaration::Record(record)
    }
}

impl From<StatePredicate> for Declaration {
    fn from(invariant: StatePredicate) -> Self {
        Declaration::Invariant(invariant)
    }
}

/// Normalizes a declaration into its canonical spec. Never fails.
pub fn resolve(declaration: impl Into<Declaration>) -> ContractSpec {
    match declaration.into() {
        Declaration::Invariant(invariant) => ContractSpec {
            invariant: Some(invariant),
            ..ContractSpec::default()
        },
        Declaration::Record(record) => {
            let failure_mode = record.failure_mode.and_then(|raw| match raw.parse::<FailureMode>() {
                Ok(mode) => Some(mode),
                Err(err) => {
                    tracing::debug!(%err, "dropping failure mode override");
                    None
                }
            });
            ContractSpec {
                precondition: record.before.or(record.requires),
                postcondition: record.after.or(record.ensures),
                invariant: record.constant.or(record.invariant),
                trace: record.trace.unwrap_or_default(),
                failure_mode,
            }
        }
    }
}
