//! Runtime value representation for contract checks.
//!
//! [`Value`] is the dynamic currency of a wrapped operation: arguments,
//! receivers and results are all `Value`s. Objects are shared records with
//! interior mutability, so a receiver observed by an invariant before a call
//! is the same record the operation mutates.

use std::cell::{BorrowError, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::id::Symbol;

/// A runtime value passed into or returned from a wrapped operation.
///
/// Scalars (`Bool`, `Number`, `String`) and `Array` are owned; `Object` is a
/// shared reference, so cloning an object value aliases the same record and
/// cyclic structures are representable.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(Symbol),
    Array(Vec<Value>),
    Object(Object),
    /// Reference to a callable, carried for rendering only.
    Function { name: Option<String> },
}

impl Value {
    /// A named function reference.
    pub fn function(name: impl Into<String>) -> Self {
        Value::Function {
            name: Some(name.into()),
        }
    }

    /// Reads a field from an object value.
    ///
    /// Returns [`Value::Undefined`] for non-objects, missing fields, and
    /// objects that are currently mutably borrowed.
    pub fn get(&self, field: &str) -> Value {
        match self {
            Value::Object(object) => object.get(field),
            _ => Value::Undefined,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Loose truthiness: `undefined`, `null`, `false`, `0`, `NaN` and the
    /// empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Returns a human-readable description of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function { .. } => "function",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Symbol(symbol)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// Contents of an [`Object`].
#[derive(Debug, Default)]
pub struct ObjectData {
    /// Runtime type label, used in messages when no explicit label is given.
    pub class_name: Option<String>,
    /// Fields in insertion order.
    pub fields: IndexMap<String, Value>,
}

/// A shared, mutable record.
///
/// Equality is identity: two `Object`s are equal only if they point at the
/// same record.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<ObjectData>>);

impl Object {
    pub fn new() -> Self {
        Object::default()
    }

    /// Creates an empty object labelled with a class name.
    pub fn with_class(class_name: impl Into<String>) -> Self {
        Object(Rc::new(RefCell::new(ObjectData {
            class_name: Some(class_name.into()),
            fields: IndexMap::new(),
        })))
    }

    /// Builds an unlabelled object from field pairs.
    pub fn from_fields<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        let object = Object::new();
        {
            let mut data = object.borrow_mut();
            for (key, value) in fields {
                data.fields.insert(key.into(), value);
            }
        }
        object
    }

    /// Class label, if set and the record is not mutably borrowed.
    pub fn class_name(&self) -> Option<String> {
        self.0.try_borrow().ok()?.class_name.clone()
    }

    pub fn get(&self, field: &str) -> Value {
        self.0
            .try_borrow()
            .ok()
            .and_then(|data| data.fields.get(field).cloned())
            .unwrap_or(Value::Undefined)
    }

    /// Writes a field, replacing any previous value in place.
    ///
    /// Panics if the record is currently borrowed, like any `RefCell` write.
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.borrow_mut().fields.insert(field.into(), value.into());
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, ObjectData>, BorrowError> {
        self.0.try_borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ObjectData> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared record, used for cycle detection.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Never walks fields: objects may be cyclic.
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.class_name().unwrap_or_else(|| "Object".to_string());
        write!(f, "Object({class}@{:#x})", self.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_reads_object_fields() {
        let object = Object::from_fields([("balance", Value::from(50))]);
        let value = Value::from(object);
        assert_eq!(value.get("balance"), Value::Number(50.0));
        assert_eq!(value.get("missing"), Value::Undefined);
    }

    #[test]
    fn get_on_non_object_is_undefined() {
        assert_eq!(Value::from(3).get("x"), Value::Undefined);
        assert_eq!(Value::Null.get("x"), Value::Undefined);
    }

    #[test]
    fn cloned_objects_alias_the_same_record() {
        let a = Object::with_class("Counter");
        let b = a.clone();
        b.set("value", 7);
        assert_eq!(a.get("value"), Value::Number(7.0));
        assert_eq!(a, b);
        assert_ne!(a, Object::with_class("Counter"));
    }

    #[test]
    fn class_name_unavailable_while_mutably_borrowed() {
        let object = Object::with_class("Person");
        let guard = object.borrow_mut();
        assert_eq!(object.class_name(), None);
        assert_eq!(object.get("age"), Value::Undefined);
        drop(guard);
        assert_eq!(object.class_name().as_deref(), Some("Person"));
    }

    #[test]
    fn debug_does_not_recurse_into_cycles() {
        let object = Object::with_class("Node");
        object.set("self", object.clone());
        let text = format!("{:?}", Value::from(object));
        assert!(text.contains("Object(Node@"));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::from(Vec::new()).is_truthy());
        assert!(Value::from(Object::new()).is_truthy());
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Undefined.type_name(), "undefined");
        assert_eq!(Value::function("f").type_name(), "function");
        assert_eq!(Value::from(vec![Value::Null]).type_name(), "array");
    }
}
