//! Design-by-contract wrapping for dynamic operations.
//!
//! A contract declaration resolves into a [`ContractSpec`]; the wrappers in
//! [`wrap`] enforce it around methods, setters and free functions, and
//! [`class::contract_class`] applies a shared invariant to a whole class.
//! Violations are raised or logged according to the effective
//! [`FailureMode`](pactum_core::FailureMode).

pub mod channel;
pub mod class;
pub mod eventual;
pub mod spec;
pub mod trace;
pub mod wrap;

pub use channel::FailureChannel;
pub use class::{contract_class, Accessor, Class, ClassBuilder, Instance, MemberKey};
pub use eventual::{Check, Completion, Eventual};
pub use spec::{resolve, ContractRecord, ContractSpec, Declaration};
pub use trace::{CheckKind, TraceEvent, TraceInput, TraceSetting};
pub use wrap::{wrap_method, wrap_setter, CallSite, Contract};
