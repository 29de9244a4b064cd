//! Class-level contracts.
//!
//! A [`Class`] is an explicit member table: methods and accessors keyed by
//! name or symbol, an optional parent, and an initializer. [`contract_class`]
//! derives a class from a base whose own methods and setters all carry a
//! shared invariant, and whose construction ends with a one-time invariant
//! check.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use pactum_core::{ContractError, FailureKind, Object, Symbol, Value, Violation};

use crate::channel::FailureChannel;
use crate::eventual::{Completion, Eventual};
use crate::spec::{resolve, ContractSpec, Declaration};
use crate::trace::{CheckKind, TraceEvent, TraceInput};
use crate::wrap::{self, wrap_method, wrap_setter, CallSite, GetterFn, MethodFn, SetterFn};

/// Name of the construction slot, never wrapped as a method.
pub const CONSTRUCTOR: &str = "constructor";

/// A member name: a string or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberKey {
    Name(String),
    Symbol(Symbol),
}

impl MemberKey {
    pub fn is_constructor(&self) -> bool {
        matches!(self, MemberKey::Name(name) if name == CONSTRUCTOR)
    }
}

impl From<&str> for MemberKey {
    fn from(name: &str) -> Self {
        MemberKey::Name(name.to_string())
    }
}

impl From<String> for MemberKey {
    fn from(name: String) -> Self {
        MemberKey::Name(name)
    }
}

impl From<Symbol> for MemberKey {
    fn from(symbol: Symbol) -> Self {
        MemberKey::Symbol(symbol)
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKey::Name(name) => f.write_str(name),
            MemberKey::Symbol(symbol) => write!(f, "{symbol}"),
        }
    }
}

/// Initializer run on a freshly allocated instance with the constructor
/// arguments.
pub type InitFn = Rc<dyn Fn(&Object, &[Value]) -> Result<(), ContractError>>;

/// A getter/setter pair. Either half may be missing.
#[derive(Clone, Default)]
pub struct Accessor {
    pub get: Option<GetterFn>,
    pub set: Option<SetterFn>,
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

pub struct Class {
    name: String,
    parent: Option<Rc<Class>>,
    init: Option<InitFn>,
    /// Invariant checked once construction has finished.
    constructor_check: Option<Rc<ContractSpec>>,
    methods: IndexMap<MemberKey, MethodFn>,
    accessors: IndexMap<MemberKey, Accessor>,
}

impl Class {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            parent: None,
            init: None,
            methods: IndexMap::new(),
            accessors: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Rc<Class>> {
        self.parent.as_ref()
    }

    /// Methods declared directly on this class, in declaration order.
    pub fn own_methods(&self) -> impl Iterator<Item = (&MemberKey, &MethodFn)> {
        self.methods.iter()
    }

    /// Accessors declared directly on this class, in declaration order.
    pub fn own_accessors(&self) -> impl Iterator<Item = (&MemberKey, &Accessor)> {
        self.accessors.iter()
    }

    /// Looks a method up on this class, then along the parent chain.
    pub fn find_method(&self, key: &MemberKey) -> Option<&MethodFn> {
        self.methods
            .get(key)
            .or_else(|| self.parent.as_ref()?.find_method(key))
    }

    pub fn find_accessor(&self, key: &MemberKey) -> Option<&Accessor> {
        self.accessors
            .get(key)
            .or_else(|| self.parent.as_ref()?.find_accessor(key))
    }

    /// Allocates an instance labelled with this class name and runs every
    /// initializer from the root of the chain down.
    pub fn construct(self: &Rc<Self>, args: &[Value]) -> Result<Instance, ContractError> {
        let this = Object::with_class(self.name.clone());
        self.initialize(&this, args)?;
        Ok(Instance {
            class: Rc::clone(self),
            this: Value::Object(this),
        })
    }

    fn initialize(&self, this: &Object, args: &[Value]) -> Result<(), ContractError> {
        if let Some(parent) = &self.parent {
            parent.initialize(this, args)?;
        }
        if let Some(init) = &self.init {
            init(this, args)?;
        }
        match &self.constructor_check {
            Some(spec) => self.check_constructed(spec, this, args),
            None => Ok(()),
        }
    }

    fn check_constructed(
        &self,
        spec: &ContractSpec,
        this: &Object,
        args: &[Value],
    ) -> Result<(), ContractError> {
        let Some(invariant) = spec.invariant() else {
            return Ok(());
        };
        let held = match invariant(&Value::Object(this.clone())) {
            Eventual::Ready(held) => held,
            Eventual::Pending(_) => {
                return Err(ContractError::configuration(format!(
                    "invariant of {} must resolve synchronously at construction",
                    self.name
                )));
            }
        };

        spec.trace().emit_with(|| TraceEvent {
            kind: CheckKind::InvariantConstructor,
            class: self.name.clone(),
            name: CONSTRUCTOR.to_string(),
            input: TraceInput::Args(args.to_vec()),
            result: None,
            passed: held,
            failure: (!held).then_some(FailureKind::ConstantConstructor),
        });
        if held {
            return Ok(());
        }
        FailureChannel::new(spec.failure_mode()).report(Violation::new(
            FailureKind::ConstantConstructor,
            self.name.clone(),
            None,
            &self.name,
        ))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("accessors", &self.accessors)
            .field("contracted", &self.constructor_check.is_some())
            .finish()
    }
}

pub struct ClassBuilder {
    name: String,
    parent: Option<Rc<Class>>,
    init: Option<InitFn>,
    methods: IndexMap<MemberKey, MethodFn>,
    accessors: IndexMap<MemberKey, Accessor>,
}

impl ClassBuilder {
    pub fn extends(mut self, parent: &Rc<Class>) -> Self {
        self.parent = Some(Rc::clone(parent));
        self
    }

    pub fn init<F>(mut self, init: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> Result<(), ContractError> + 'static,
    {
        self.init = Some(Rc::new(init));
        self
    }

    pub fn method<F>(mut self, key: impl Into<MemberKey>, op: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Completion + 'static,
    {
        self.methods.insert(key.into(), wrap::method(op));
        self
    }

    pub fn getter<F>(mut self, key: impl Into<MemberKey>, get: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        self.accessors.entry(key.into()).or_default().get = Some(wrap::getter(get));
        self
    }

    pub fn setter<F>(mut self, key: impl Into<MemberKey>, set: F) -> Self
    where
        F: Fn(&Value, Value) -> Completion + 'static,
    {
        self.accessors.entry(key.into()).or_default().set = Some(wrap::setter(set));
        self
    }

    pub fn build(self) -> Rc<Class> {
        Rc::new(Class {
            name: self.name,
            parent: self.parent,
            init: self.init,
            constructor_check: None,
            methods: self.methods,
            accessors: self.accessors,
        })
    }
}

/// A constructed object together with the class it dispatches through.
#[derive(Debug, Clone)]
pub struct Instance {
    class: Rc<Class>,
    this: Value,
}

impl Instance {
    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub fn receiver(&self) -> &Value {
        &self.this
    }

    pub fn call(&self, key: impl Into<MemberKey>, args: &[Value]) -> Completion {
        let key = key.into();
        match self.class.find_method(&key) {
            Some(op) => op(&self.this, args),
            None => Completion::raised(ContractError::operation(format!(
                "{}.{key} is not a method",
                self.class.name
            ))),
        }
    }

    /// Reads through a getter when one exists, else the plain field.
    pub fn get(&self, key: impl Into<MemberKey>) -> Value {
        let key = key.into();
        if let Some(get) = self.class.find_accessor(&key).and_then(|a| a.get.as_ref()) {
            return get(&self.this);
        }
        match &key {
            MemberKey::Name(name) => self.this.get(name),
            MemberKey::Symbol(_) => Value::Undefined,
        }
    }

    /// Writes through a setter when one exists, else the plain field.
    pub fn set(&self, key: impl Into<MemberKey>, value: impl Into<Value>) -> Completion {
        let key = key.into();
        let value = value.into();
        if let Some(accessor) = self.class.find_accessor(&key) {
            return match &accessor.set {
                Some(set) => set(&self.this, value),
                None => Completion::raised(ContractError::operation(format!(
                    "{}.{key} has a getter but no setter",
                    self.class.name
                ))),
            };
        }
        match (&key, self.this.as_object()) {
            (MemberKey::Name(name), Some(object)) => {
                object.set(name.clone(), value);
                Completion::returned(Value::Undefined)
            }
            _ => Completion::raised(ContractError::operation(format!(
                "cannot assign {}.{key}",
                self.class.name
            ))),
        }
    }
}

/// Derives a class whose methods and setters all check `declaration`'s
/// invariant.
///
/// Only the base's own members are wrapped; members inherited from further
/// ancestors stay reachable unwrapped. The derived class keeps the base
/// name. Fails with a configuration error when the declaration has no
/// invariant.
pub fn contract_class(
    base: &Rc<Class>,
    declaration: impl Into<Declaration>,
) -> Result<Rc<Class>, ContractError> {
    let spec = resolve(declaration);
    if spec.invariant().is_none() {
        return Err(ContractError::configuration(format!(
            "class contract on {} requires an invariant",
            base.name
        )));
    }
    let shared = Rc::new(spec.invariant_only());
    let site = |key: &MemberKey| CallSite::new(base.name.clone(), key.to_string());

    let methods: IndexMap<MemberKey, MethodFn> = base
        .methods
        .iter()
        .filter(|(key, _)| !key.is_constructor())
        .map(|(key, op)| {
            let wrapped = wrap_method(site(key), Rc::clone(&shared), Rc::clone(op));
            (key.clone(), wrapped)
        })
        .collect();

    let accessors: IndexMap<MemberKey, Accessor> = base
        .accessors
        .iter()
        .filter(|(key, _)| !key.is_constructor())
        .map(|(key, accessor)| {
            let set = accessor
                .set
                .as_ref()
                .map(|set| wrap_setter(site(key), Rc::clone(&shared), Rc::clone(set)));
            let accessor = Accessor {
                get: accessor.get.clone(),
                set,
            };
            (key.clone(), accessor)
        })
        .collect();

    tracing::debug!(
        class = %base.name,
        methods = methods.len(),
        accessors = accessors.len(),
        "class contract applied"
    );

    Ok(Rc::new(Class {
        name: base.name.clone(),
        parent: Some(Rc::clone(base)),
        init: None,
        constructor_check: Some(shared),
        methods,
        accessors,
    }))
}
