//! Per-invocation evaluation record.
//!
//! The protocol runs in a fixed order:
//! `InvariantBefore -> Precondition -> Invocation -> Postcondition -> InvariantAfter`.
//! [`Evaluation`] holds each stage's outcome as it is produced, plus the
//! first stage that had to wait on a pending value. Once a stage has an
//! outcome it is never evaluated again for that invocation.

use pactum_core::Value;

/// A step of the check protocol, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    InvariantBefore,
    Precondition,
    Invocation,
    Postcondition,
    InvariantAfter,
}

/// Outcomes recorded so far for one invocation.
#[derive(Debug, Default)]
pub struct Evaluation {
    pub invariant_before: Option<bool>,
    pub precondition: Option<bool>,
    /// Value returned by the wrapped operation, once it has run.
    pub result: Option<Value>,
    pub postcondition: Option<bool>,
    pub invariant_after: Option<bool>,
    /// First stage whose value was pending.
    pub suspended_at: Option<Stage>,
}

impl Evaluation {
    /// Records a predicate outcome. `Invocation` is recorded through
    /// [`Evaluation::record_result`].
    pub fn record(&mut self, stage: Stage, held: bool) {
        let slot = match stage {
            Stage::InvariantBefore => &mut self.invariant_before,
            Stage::Precondition => &mut self.precondition,
            Stage::Postcondition => &mut self.postcondition,
            Stage::InvariantAfter => &mut self.invariant_after,
            Stage::Invocation => return,
        };
        debug_assert!(slot.is_none(), "stage {stage:?} evaluated twice");
        *slot = Some(held);
    }

    pub fn record_result(&mut self, result: &Value) {
        self.result = Some(result.clone());
    }

    pub fn suspend(&mut self, stage: Stage) {
        if self.suspended_at.is_none() {
            self.suspended_at = Some(stage);
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }

    /// Whether the wrapped operation has run.
    pub fn invoked(&self) -> bool {
        self.result.is_some()
    }
}
