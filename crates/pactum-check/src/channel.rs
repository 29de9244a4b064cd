//! Failure reporting.
//!
//! [`FailureChannel`] decides, per violation, whether to return an error or
//! to log the diagnostic and let execution continue. A contract's own
//! failure mode wins over the process-wide default; the default is read at
//! report time, not when the contract was built.

use pactum_core::{failure_mode, ContractError, FailureMode, Violation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureChannel {
    override_mode: Option<FailureMode>,
}

impl FailureChannel {
    pub fn new(override_mode: Option<FailureMode>) -> Self {
        FailureChannel { override_mode }
    }

    pub fn effective_mode(&self) -> FailureMode {
        self.override_mode.unwrap_or_else(failure_mode)
    }

    /// Raises the violation in `throw` mode; logs it and returns `Ok` in
    /// `log` mode.
    pub fn report(&self, violation: Violation) -> Result<(), ContractError> {
        match self.effective_mode() {
            FailureMode::Throw => Err(ContractError::Violation(violation)),
            FailureMode::Log => {
                tracing::error!(
                    target: "pactum::violation",
                    failure = violation.failure.as_str(),
                    class = %violation.class,
                    "{}",
                    violation.message
                );
                Ok(())
            }
        }
    }
}
