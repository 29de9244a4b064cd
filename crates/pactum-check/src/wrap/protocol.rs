//! The check protocol, shared by method and setter wrappers.
//!
//! The five stages are written once, as one `async` body. Each stage value
//! (a predicate outcome or the operation's own result) is awaited only when
//! it is actually pending. [`invoke`] polls that body a single time with a
//! no-op waker: if nothing was pending the body has already finished and the
//! caller gets [`Eventual::Ready`]; otherwise the partly-run body itself is
//! handed back as [`Eventual::Pending`] and resumes where it stopped, so a
//! stage that already produced an outcome is never evaluated again.

use std::cell::RefCell;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::task::noop_waker_ref;

use pactum_core::format::{render, render_args};
use pactum_core::{ContractError, FailureKind, Value, Violation};

use crate::channel::FailureChannel;
use crate::eventual::{Completion, Eventual};
use crate::spec::ContractSpec;
use crate::trace::{CheckKind, TraceEvent, TraceInput};

use super::state::{Evaluation, Stage};
use super::{CallSite, MethodFn, SetterFn};

/// The wrapped operation together with what it was called with.
pub(crate) enum Invocation {
    Method { op: MethodFn, args: Vec<Value> },
    Setter { op: SetterFn, value: Value },
}

impl Invocation {
    /// Input seen by the precondition.
    fn inputs(&self) -> &[Value] {
        match self {
            Invocation::Method { args, .. } => args,
            Invocation::Setter { value, .. } => std::slice::from_ref(value),
        }
    }

    fn call(&self, receiver: &Value) -> Completion {
        match self {
            Invocation::Method { op, args } => op(receiver, args),
            Invocation::Setter { op, value } => op(receiver, value.clone()),
        }
    }

    /// `Class.member(args)` or `Class.set member(value)`.
    fn subject(&self, class: &str, member: &str) -> String {
        match self {
            Invocation::Method { args, .. } => format!("{class}.{member}({})", render_args(args)),
            Invocation::Setter { value, .. } => format!("{class}.set {member}({})", render(value)),
        }
    }

    fn trace_input(&self) -> TraceInput {
        match self {
            Invocation::Method { args, .. } => TraceInput::Args(args.clone()),
            Invocation::Setter { value, .. } => TraceInput::Value(value.clone()),
        }
    }

    fn precondition_failure(&self) -> FailureKind {
        match self {
            Invocation::Method { .. } => FailureKind::Before,
            Invocation::Setter { .. } => FailureKind::SetterBefore,
        }
    }

    fn postcondition_failure(&self) -> FailureKind {
        match self {
            Invocation::Method { .. } => FailureKind::After,
            Invocation::Setter { .. } => FailureKind::SetterAfter,
        }
    }
}

/// Everything one invocation needs, owned so the protocol can outlive the
/// caller's borrow when it suspends.
pub(crate) struct Frame {
    site: Rc<CallSite>,
    spec: Rc<ContractSpec>,
    receiver: Value,
    invocation: Invocation,
    /// Resolved once per call from the site label and the receiver.
    class: String,
    channel: FailureChannel,
    evaluation: Rc<RefCell<Evaluation>>,
}

impl Frame {
    pub(crate) fn new(
        site: Rc<CallSite>,
        spec: Rc<ContractSpec>,
        receiver: Value,
        invocation: Invocation,
    ) -> Self {
        let class = site.class_label(&receiver);
        let channel = FailureChannel::new(spec.failure_mode());
        Frame {
            site,
            spec,
            receiver,
            invocation,
            class,
            channel,
            evaluation: Rc::new(RefCell::new(Evaluation::default())),
        }
    }

    async fn settle<T>(&self, stage: Stage, value: Eventual<T>) -> T {
        match value {
            Eventual::Ready(value) => value,
            Eventual::Pending(fut) => {
                self.evaluation.borrow_mut().suspend(stage);
                fut.await
            }
        }
    }

    /// Records and traces one check, then reports it if it failed.
    fn observe(
        &self,
        kind: CheckKind,
        stage: Stage,
        held: bool,
        failure: FailureKind,
        result: Option<&Value>,
    ) -> Result<(), ContractError> {
        self.evaluation.borrow_mut().record(stage, held);
        self.spec.trace().emit_with(|| TraceEvent {
            kind,
            class: self.class.clone(),
            name: self.site.member().to_string(),
            input: self.invocation.trace_input(),
            result: result.cloned(),
            passed: held,
            failure: (!held).then_some(failure),
        });
        if held {
            return Ok(());
        }

        let mut subject = self.invocation.subject(&self.class, self.site.member());
        if let Some(result) = result {
            subject.push_str(" -> ");
            subject.push_str(&render(result));
        }
        self.channel.report(Violation::new(
            failure,
            self.class.clone(),
            Some(self.site.member().to_string()),
            &subject,
        ))
    }

    async fn stages(&self) -> Result<Value, ContractError> {
        if let Some(invariant) = self.spec.invariant() {
            let held = self
                .settle(Stage::InvariantBefore, invariant(&self.receiver))
                .await;
            self.observe(
                CheckKind::InvariantBefore,
                Stage::InvariantBefore,
                held,
                FailureKind::ConstantBefore,
                None,
            )?;
            if !held {
                return Ok(Value::Undefined);
            }
        }

        if let Some(precondition) = self.spec.precondition() {
            let held = self
                .settle(Stage::Precondition, precondition(self.invocation.inputs()))
                .await;
            self.observe(
                CheckKind::Precondition,
                Stage::Precondition,
                held,
                self.invocation.precondition_failure(),
                None,
            )?;
            if !held {
                return Ok(Value::Undefined);
            }
        }

        let result = self
            .settle(Stage::Invocation, self.invocation.call(&self.receiver))
            .await?;
        self.evaluation.borrow_mut().record_result(&result);

        // From here on the operation has run: failures are reported but the
        // result is kept.
        if let Some(postcondition) = self.spec.postcondition() {
            let inputs = self.invocation.inputs();
            let mut with_result = Vec::with_capacity(inputs.len() + 1);
            with_result.push(result.clone());
            with_result.extend_from_slice(inputs);
            let held = self
                .settle(Stage::Postcondition, postcondition(with_result.as_slice()))
                .await;
            self.observe(
                CheckKind::Postcondition,
                Stage::Postcondition,
                held,
                self.invocation.postcondition_failure(),
                Some(&result),
            )?;
        }

        if let Some(invariant) = self.spec.invariant() {
            let held = self
                .settle(Stage::InvariantAfter, invariant(&self.receiver))
                .await;
            self.observe(
                CheckKind::InvariantAfter,
                Stage::InvariantAfter,
                held,
                FailureKind::ConstantAfter,
                Some(&result),
            )?;
        }

        Ok(result)
    }

    async fn run(self) -> Result<Value, ContractError> {
        let outcome = self.stages().await;
        tracing::trace!(
            target: "pactum::eval",
            class = %self.class,
            member = %self.site.member(),
            evaluation = ?self.evaluation.borrow(),
            ok = outcome.is_ok(),
            "contract evaluation finished"
        );
        outcome
    }
}

/// Runs the protocol for one call.
///
/// Returns `Ready` when every stage was synchronous, `Pending` as soon as
/// any stage value was pending, even if that value happened to resolve
/// during the first poll.
pub(crate) fn invoke(frame: Frame) -> Completion {
    let evaluation = Rc::clone(&frame.evaluation);
    let mut protocol: LocalBoxFuture<'static, Result<Value, ContractError>> =
        frame.run().boxed_local();
    let mut cx = Context::from_waker(noop_waker_ref());
    match protocol.poll_unpin(&mut cx) {
        Poll::Ready(outcome) if !evaluation.borrow().is_suspended() => Eventual::Ready(outcome),
        Poll::Ready(outcome) => Eventual::Pending(future::ready(outcome).boxed_local()),
        Poll::Pending => Eventual::Pending(protocol),
    }
}
