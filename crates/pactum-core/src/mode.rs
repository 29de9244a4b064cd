//! Failure mode and the process-wide default.
//!
//! A violation is either raised as an error ([`FailureMode::Throw`]) or
//! written to the log ([`FailureMode::Log`]). Individual contracts may
//! override the mode; otherwise the process-wide default applies.
//!
//! The default lives in a single atomic cell. [`set_failure_mode`] returns
//! the previous value so callers can restore it afterwards. Nothing guards
//! against two callers restoring concurrently: the last store wins.
//!
//! On first use the default is read from the `PACTUM_FAILURE_MODE`
//! environment variable (`log` or `throw`); anything else means `log`.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable consulted for the initial default.
pub const FAILURE_MODE_ENV: &str = "PACTUM_FAILURE_MODE";

const UNSET: u8 = 0;
const LOG: u8 = 1;
const THROW: u8 = 2;

static DEFAULT_MODE: AtomicU8 = AtomicU8::new(UNSET);

/// How a violation is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Write a diagnostic and continue.
    #[default]
    Log,
    /// Return the violation as an error.
    Throw,
}

impl FailureMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureMode::Log => "log",
            FailureMode::Throw => "throw",
        }
    }

    fn encode(self) -> u8 {
        match self {
            FailureMode::Log => LOG,
            FailureMode::Throw => THROW,
        }
    }

    fn decode(raw: u8) -> Option<Self> {
        match raw {
            LOG => Some(FailureMode::Log),
            THROW => Some(FailureMode::Throw),
            _ => None,
        }
    }
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that names no failure mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown failure mode: '{0}' (expected 'log' or 'throw')")]
pub struct UnknownFailureMode(pub String);

impl FromStr for FailureMode {
    type Err = UnknownFailureMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(FailureMode::Log),
            "throw" => Ok(FailureMode::Throw),
            _ => Err(UnknownFailureMode(s.to_string())),
        }
    }
}

/// Returns the process-wide default failure mode.
pub fn failure_mode() -> FailureMode {
    match FailureMode::decode(DEFAULT_MODE.load(Ordering::Relaxed)) {
        Some(mode) => mode,
        None => {
            let initial = from_env();
            // A concurrent setter may have stored first; keep its value.
            match DEFAULT_MODE.compare_exchange(
                UNSET,
                initial.encode(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => initial,
                Err(current) => FailureMode::decode(current).unwrap_or(initial),
            }
        }
    }
}

/// Replaces the process-wide default and returns the previous one.
pub fn set_failure_mode(mode: FailureMode) -> FailureMode {
    let previous = DEFAULT_MODE.swap(mode.encode(), Ordering::Relaxed);
    FailureMode::decode(previous).unwrap_or_else(from_env)
}

fn from_env() -> FailureMode {
    match std::env::var(FAILURE_MODE_ENV) {
        Ok(raw) => raw.parse().unwrap_or_else(|err: UnknownFailureMode| {
            tracing::warn!("{err}; using '{}'", FailureMode::default());
            FailureMode::default()
        }),
        Err(_) => FailureMode::default(),
    }
}
