//! Symbol identities.
//!
//! A [`Symbol`] is a unique token usable as a value and as a member key.
//! Two symbols are equal only when they share a [`SymbolId`], regardless of
//! their descriptions.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_SYMBOL: AtomicU32 = AtomicU32::new(0);

/// Stable symbol identifier, allocated from a process-wide counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique token with an optional description.
#[derive(Debug, Clone)]
pub struct Symbol {
    id: SymbolId,
    description: Option<Rc<str>>,
}

impl Symbol {
    /// Creates a fresh symbol. Every call yields a distinct identity.
    pub fn new(description: impl Into<String>) -> Self {
        Symbol {
            id: SymbolId(NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed)),
            description: Some(Rc::from(description.into())),
        }
    }

    /// Creates a fresh symbol without a description.
    pub fn anonymous() -> Self {
        Symbol {
            id: SymbolId(NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed)),
            description: None,
        }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// Renders like a symbol literal: `Symbol(desc)`.
impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_with_same_description_are_distinct() {
        let a = Symbol::new("audit");
        let b = Symbol::new("audit");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn symbol_display() {
        assert_eq!(Symbol::new("tag").to_string(), "Symbol(tag)");
        assert_eq!(Symbol::anonymous().to_string(), "Symbol()");
    }

    #[test]
    fn symbol_ids_increase() {
        let a = Symbol::anonymous();
        let b = Symbol::anonymous();
        assert!(b.id() > a.id());
    }
}
