//! Values that are either available now or later.
//!
//! Predicates and operations return an [`Eventual`]: `Ready` when they
//! computed their answer synchronously, `Pending` when they hand back a
//! future. The wrapper inspects each stage's value and only suspends when it
//! actually meets a `Pending` one.

use std::future::Future;

use futures::future::{self, FutureExt, LocalBoxFuture};

use pactum_core::{ContractError, Value};

/// A value that is either ready or still pending.
pub enum Eventual<T> {
    Ready(T),
    Pending(LocalBoxFuture<'static, T>),
}

/// Outcome of a predicate.
pub type Check = Eventual<bool>;

/// Outcome of an operation.
pub type Completion = Eventual<Result<Value, ContractError>>;

impl<T: 'static> Eventual<T> {
    /// Wraps a future.
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = T> + 'static,
    {
        Eventual::Pending(fut.boxed_local())
    }

    /// Converts into a future, resolving immediately when already ready.
    pub fn into_future(self) -> LocalBoxFuture<'static, T> {
        match self {
            Eventual::Ready(value) => future::ready(value).boxed_local(),
            Eventual::Pending(fut) => fut,
        }
    }

    pub fn map<U, F>(self, f: F) -> Eventual<U>
    where
        U: 'static,
        F: FnOnce(T) -> U + 'static,
    {
        match self {
            Eventual::Ready(value) => Eventual::Ready(f(value)),
            Eventual::Pending(fut) => Eventual::Pending(fut.map(f).boxed_local()),
        }
    }
}

impl<T> Eventual<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Eventual::Pending(_))
    }

    /// The value, if it is available without awaiting.
    pub fn now(self) -> Option<T> {
        match self {
            Eventual::Ready(value) => Some(value),
            Eventual::Pending(_) => None,
        }
    }
}

impl Eventual<Result<Value, ContractError>> {
    /// A completed operation returning `value`.
    pub fn returned(value: impl Into<Value>) -> Self {
        Eventual::Ready(Ok(value.into()))
    }

    /// A completed operation that failed.
    pub fn raised(err: ContractError) -> Self {
        Eventual::Ready(Err(err))
    }
}

impl<T> From<T> for Eventual<T> {
    fn from(value: T) -> Self {
        Eventual::Ready(value)
    }
}

impl<T> std::fmt::Debug for Eventual<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Eventual::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Eventual::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}
