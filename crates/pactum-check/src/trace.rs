//! Check tracing.
//!
//! Every check a wrapped operation performs produces one [`TraceEvent`],
//! whether it passed or failed. Events go to a user-supplied sink or, by
//! default, to a `tracing` debug event on the `pactum::trace` target.
//! A sink that panics is ignored: tracing never changes program behavior.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

use pactum_core::format::{render, render_args, to_json};
use pactum_core::{FailureKind, Value};

/// Which check an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    InvariantBefore,
    Precondition,
    Postcondition,
    InvariantAfter,
    InvariantConstructor,
}

impl CheckKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::InvariantBefore => "invariant-before",
            CheckKind::Precondition => "precondition",
            CheckKind::Postcondition => "postcondition",
            CheckKind::InvariantAfter => "invariant-after",
            CheckKind::InvariantConstructor => "invariant-constructor",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the checked operation received.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceInput {
    /// Argument list of a method or constructor.
    Args(Vec<Value>),
    /// Value handed to a setter.
    Value(Value),
}

impl TraceInput {
    fn rendered(&self) -> String {
        match self {
            TraceInput::Args(args) => render_args(args),
            TraceInput::Value(value) => render(value),
        }
    }
}

/// A single check evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub kind: CheckKind,
    /// Class label of the receiver.
    pub class: String,
    /// Member name (`constructor` for construction checks).
    pub name: String,
    pub input: TraceInput,
    /// Operation result, present for postcondition and invariant-after checks.
    pub result: Option<Value>,
    pub passed: bool,
    /// Diagnostic kind when the check failed.
    pub failure: Option<FailureKind>,
}

impl TraceEvent {
    /// Renders the event as a JSON mapping with `kind`, `class`, `name`,
    /// `args` or `value`, and `result` when present.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = Map::new();
        map.insert("kind".into(), json!(self.kind.as_str()));
        map.insert("class".into(), json!(self.class));
        map.insert("name".into(), json!(self.name));
        match &self.input {
            TraceInput::Args(args) => {
                map.insert("args".into(), args.iter().map(to_json).collect());
            }
            TraceInput::Value(value) => {
                map.insert("value".into(), to_json(value));
            }
        }
        if let Some(result) = &self.result {
            map.insert("result".into(), to_json(result));
        }
        map.insert("passed".into(), json!(self.passed));
        if let Some(failure) = self.failure {
            map.insert("failure".into(), json!(failure.as_str()));
        }
        serde_json::Value::Object(map)
    }
}

/// Receiver of trace events.
pub type TraceSink = Rc<dyn Fn(&TraceEvent)>;

/// Where trace events go.
#[derive(Clone, Default)]
pub enum TraceSetting {
    Disabled,
    /// `tracing` debug events on the `pactum::trace` target.
    #[default]
    Default,
    Sink(TraceSink),
}

impl TraceSetting {
    pub fn sink<F>(sink: F) -> Self
    where
        F: Fn(&TraceEvent) + 'static,
    {
        TraceSetting::Sink(Rc::new(sink))
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, TraceSetting::Disabled)
    }

    /// Emits the event built by `event`; nothing is built when disabled.
    pub fn emit_with(&self, event: impl FnOnce() -> TraceEvent) {
        match self {
            TraceSetting::Disabled => {}
            TraceSetting::Default => default_sink(&event()),
            TraceSetting::Sink(sink) => {
                let event = event();
                if panic::catch_unwind(AssertUnwindSafe(|| sink(&event))).is_err() {
                    tracing::debug!(
                        target: "pactum::trace",
                        kind = event.kind.as_str(),
                        "trace sink panicked; event dropped"
                    );
                }
            }
        }
    }
}

impl From<bool> for TraceSetting {
    fn from(enabled: bool) -> Self {
        if enabled {
            TraceSetting::Default
        } else {
            TraceSetting::Disabled
        }
    }
}

impl fmt::Debug for TraceSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceSetting::Disabled => f.write_str("Disabled"),
            TraceSetting::Default => f.write_str("Default"),
            TraceSetting::Sink(_) => f.write_str("Sink(..)"),
        }
    }
}

fn default_sink(event: &TraceEvent) {
    tracing::debug!(
        target: "pactum::trace",
        kind = event.kind.as_str(),
        class = %event.class,
        name = %event.name,
        input = %event.input.rendered(),
        result = ?event.result.as_ref().map(render),
        passed = event.passed,
        failure = ?event.failure.map(FailureKind::as_str),
        "contract check"
    );
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn event(passed: bool) -> TraceEvent {
        TraceEvent {
            kind: CheckKind::Postcondition,
            class: "Counter".into(),
            name: "add".into(),
            input: TraceInput::Args(vec![Value::from(2), Value::from("x")]),
            result: Some(Value::from(3)),
            passed,
            failure: (!passed).then_some(FailureKind::After),
        }
    }

    #[test]
    fn sink_receives_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let setting = TraceSetting::sink(move |e: &TraceEvent| log.borrow_mut().push(e.clone()));
        setting.emit_with(|| event(true));
        assert_eq!(seen.borrow().as_slice(), &[event(true)]);
    }

    #[test]
    fn disabled_never_builds_the_event() {
        let setting = TraceSetting::from(false);
        setting.emit_with(|| panic!("event built while tracing is disabled"));
        assert!(!setting.is_enabled());
    }

    #[test]
    fn panicking_sink_is_swallowed() {
        let setting = TraceSetting::sink(|_: &TraceEvent| panic!("sink failure"));
        setting.emit_with(|| event(false));
    }

    #[test]
    fn json_shape_for_method_events() {
        assert_eq!(
            event(false).to_json(),
            json!({
                "kind": "postcondition",
                "class": "Counter",
                "name": "add",
                "args": [2, "x"],
                "result": 3,
                "passed": false,
                "failure": "after",
            })
        );
    }

    #[test]
    fn json_shape_for_setter_events() {
        let e = TraceEvent {
            kind: CheckKind::Precondition,
            class: "Person".into(),
            name: "age".into(),
            input: TraceInput::Value(Value::from(-1)),
            result: None,
            passed: true,
            failure: None,
        };
        let json = e.to_json();
        assert_eq!(json["value"], json!(-1));
        assert!(json.get("args").is_none());
        assert!(json.get("result").is_none());
        assert!(json.get("failure").is_none());
    }

    #[test]
    fn check_kinds_use_kebab_case() {
        assert_eq!(CheckKind::InvariantConstructor.to_string(), "invariant-constructor");
        assert_eq!(
            serde_json::to_string(&CheckKind::InvariantBefore).unwrap(),
            "\"invariant-before\""
        );
    }
}
