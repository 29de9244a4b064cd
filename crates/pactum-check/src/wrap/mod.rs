//! Operation wrapping.
//!
//! [`wrap_method`] and [`wrap_setter`] take an operation and a resolved
//! [`ContractSpec`] and return a replacement operation that runs the check
//! protocol around every call:
//!
//! 1. invariant against the receiver (`constant-before`)
//! 2. precondition against the input (`before` / `setter-before`)
//! 3. the operation itself
//! 4. postcondition against the result and input (`after` / `setter-after`)
//! 5. invariant against the receiver again (`constant-after`)
//!
//! A failure in stage 1 or 2 means the operation never runs; the call yields
//! `undefined` in `log` mode. Failures in stage 4 or 5 keep the result.
//! A call whose checks and body are all synchronous completes synchronously;
//! if any of them is pending, the whole call is pending.

mod protocol;
pub mod state;


use std::rc::Rc;

use pactum_core::Value;

use crate::eventual::Completion;
use crate::spec::{resolve, ContractSpec, Declaration};

use protocol::{Frame, Invocation};

/// A method: receiver and argument list in, one value out.
pub type MethodFn = Rc<dyn Fn(&Value, &[Value]) -> Completion>;

/// The write half of an accessor.
pub type SetterFn = Rc<dyn Fn(&Value, Value) -> Completion>;

/// The read half of an accessor. Never wrapped.
pub type GetterFn = Rc<dyn Fn(&Value) -> Value>;

/// A free function without a receiver.
pub type FunctionFn = Rc<dyn Fn(&[Value]) -> Completion>;

/// Class label used when neither the call site nor the receiver has one.
pub const ANONYMOUS_CLASS: &str = "<anonymous>";

pub fn method<F>(f: F) -> MethodFn
where
    F: Fn(&Value, &[Value]) -> Completion + 'static,
{
    Rc::new(f)
}

pub fn setter<F>(f: F) -> SetterFn
where
    F: Fn(&Value, Value) -> Completion + 'static,
{
    Rc::new(f)
}

pub fn getter<F>(f: F) -> GetterFn
where
    F: Fn(&Value) -> Value + 'static,
{
    Rc::new(f)
}

/// Names the operation being wrapped, for messages and trace events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    class: Option<String>,
    member: String,
}

impl CallSite {
    pub fn new(class: impl Into<String>, member: impl Into<String>) -> Self {
        CallSite {
            class: Some(class.into()),
            member: member.into(),
        }
    }

    /// A site without a class label; the receiver's class name is used
    /// when available.
    pub fn detached(member: impl Into<String>) -> Self {
        CallSite {
            class: None,
            member: member.into(),
        }
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    /// Explicit label, else the receiver's class name, else
    /// [`ANONYMOUS_CLASS`].
    pub fn class_label(&self, receiver: &Value) -> String {
        self.class
            .clone()
            .or_else(|| receiver.as_object().and_then(|object| object.class_name()))
            .unwrap_or_else(|| ANONYMOUS_CLASS.to_string())
    }
}

/// Wraps a method with the checks in `spec`.
pub fn wrap_method(site: CallSite, spec: Rc<ContractSpec>, op: MethodFn) -> MethodFn {
    let site = Rc::new(site);
    Rc::new(move |receiver: &Value, args: &[Value]| {
        protocol::invoke(Frame::new(
            Rc::clone(&site),
            Rc::clone(&spec),
            receiver.clone(),
            Invocation::Method {
                op: Rc::clone(&op),
                args: args.to_vec(),
            },
        ))
    })
}

/// Wraps the write half of an accessor with the checks in `spec`.
pub fn wrap_setter(site: CallSite, spec: Rc<ContractSpec>, op: SetterFn) -> SetterFn {
    let site = Rc::new(site);
    Rc::new(move |receiver: &Value, value: Value| {
        protocol::invoke(Frame::new(
            Rc::clone(&site),
            Rc::clone(&spec),
            receiver.clone(),
            Invocation::Setter {
                op: Rc::clone(&op),
                value,
            },
        ))
    })
}

/// A resolved contract that can be applied to any number of operations.
///
/// Every operation wrapped through the same `Contract` shares one spec.
#[derive(Debug, Clone)]
pub struct Contract {
    spec: Rc<ContractSpec>,
}

impl Contract {
    pub fn new(declaration: impl Into<Declaration>) -> Self {
        Contract {
            spec: Rc::new(resolve(declaration)),
        }
    }

    pub fn spec(&self) -> &Rc<ContractSpec> {
        &self.spec
    }

    pub fn wrap_method(&self, site: CallSite, op: MethodFn) -> MethodFn {
        wrap_method(site, Rc::clone(&self.spec), op)
    }

    pub fn wrap_setter(&self, site: CallSite, op: SetterFn) -> SetterFn {
        wrap_setter(site, Rc::clone(&self.spec), op)
    }

    /// Wraps a free function. Its receiver is `undefined`, so invariants
    /// see `undefined` and messages use the site's class label if any.
    pub fn wrap_function(&self, site: CallSite, op: FunctionFn) -> FunctionFn {
        let wrapped = self.wrap_method(site, Rc::new(move |_: &Value, args: &[Value]| op(args)));
        Rc::new(move |args: &[Value]| wrapped(&Value::Undefined, args))
    }
}
