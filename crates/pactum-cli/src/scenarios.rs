//! Built-in demonstration scenarios.
//!
//! Each scenario wraps a small class or function, performs a fixed sequence
//! of calls, and returns the last call's outcome. Contracts carry no failure
//! mode override, so the process-wide mode chosen on the command line
//! applies.

use std::rc::Rc;

use futures::executor::block_on;

use pactum_check::wrap::{method, setter, FunctionFn};
use pactum_check::{
    contract_class, CallSite, Check, Class, Completion, Contract, ContractRecord, TraceEvent,
    TraceSetting,
};
use pactum_core::{render, ContractError, Object, Value};

pub struct Scenario {
    pub name: &'static str,
    pub about: &'static str,
    run: fn(&TraceSetting) -> Result<Value, ContractError>,
}

impl Scenario {
    pub fn run(&self, trace: &TraceSetting) -> Result<Value, ContractError> {
        (self.run)(trace)
    }
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "counter",
        about: "decrement a counter below its non-negative invariant",
        run: counter,
    },
    Scenario {
        name: "person",
        about: "assign a negative age through a checked setter",
        run: person,
    },
    Scenario {
        name: "calculator",
        about: "add NaN to a function that requires finite numbers",
        run: calculator,
    },
    Scenario {
        name: "account",
        about: "overdraw an account whose class keeps a non-negative balance",
        run: account,
    },
    Scenario {
        name: "deferred",
        about: "the counter scenario with asynchronous checks",
        run: deferred,
    },
];

pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.name == name)
}

/// Trace setting for `--trace`: one JSON line per check on stdout.
pub fn json_lines() -> TraceSetting {
    TraceSetting::sink(|event: &TraceEvent| println!("{}", event.to_json()))
}

fn step(label: &str, completion: Completion) -> Result<Value, ContractError> {
    let pending = completion.is_pending();
    let outcome = block_on(completion.into_future());
    match &outcome {
        Ok(value) => println!("{label} -> {}{}", render(value), if pending { " (async)" } else { "" }),
        Err(err) => println!("{label} !! {err}"),
    }
    outcome
}

fn number(value: &Value) -> f64 {
    value.as_number().unwrap_or(0.0)
}

fn decrement(this: &Value, args: &[Value]) -> Completion {
    let next = number(&this.get("value")) - args.first().map(number).unwrap_or(0.0);
    match this.as_object() {
        Some(object) => {
            object.set("value", next);
            Completion::returned(next)
        }
        None => Completion::raised(ContractError::operation("dec called without a receiver")),
    }
}

fn counter(trace: &TraceSetting) -> Result<Value, ContractError> {
    let contract = Contract::new(
        ContractRecord::new()
            .invariant(|this: &Value| number(&this.get("value")) >= 0.0)
            .trace(trace.clone()),
    );
    let dec = contract.wrap_method(CallSite::new("Counter", "dec"), method(decrement));

    let this = Object::with_class("Counter");
    this.set("value", 1);
    step("Counter.dec(2)", dec(&Value::from(this), &[Value::from(2)]))
}

fn person(trace: &TraceSetting) -> Result<Value, ContractError> {
    let contract = Contract::new(
        ContractRecord::new()
            .before(|args: &[Value]| {
                args[0]
                    .as_number()
                    .is_some_and(|n| n >= 0.0 && n.fract() == 0.0)
            })
            .trace(trace.clone()),
    );
    let set_age = contract.wrap_setter(
        CallSite::new("Person", "age"),
        setter(|this: &Value, value: Value| match this.as_object() {
            Some(object) => {
                object.set("age", value);
                Completion::returned(Value::Undefined)
            }
            None => Completion::raised(ContractError::operation("age set without a receiver")),
        }),
    );

    let this = Value::from(Object::with_class("Person"));
    step("Person.set age(30)", set_age(&this, Value::from(30)))?;
    let outcome = step("Person.set age(-1)", set_age(&this, Value::from(-1)));
    println!("age is {}", render(&this.get("age")));
    outcome
}

fn calculator(trace: &TraceSetting) -> Result<Value, ContractError> {
    let contract = Contract::new(
        ContractRecord::new()
            .requires(|args: &[Value]| {
                args.iter()
                    .all(|arg| arg.as_number().is_some_and(f64::is_finite))
            })
            .ensures(|args: &[Value]| args[0].as_number().is_some())
            .trace(trace.clone()),
    );
    let add: FunctionFn = Rc::new(|args: &[Value]| {
        Completion::returned(args.iter().map(number).sum::<f64>())
    });
    let add = contract.wrap_function(CallSite::new("Calculator", "add"), add);

    step("add(1, 2)", add(&[Value::from(1), Value::from(2)]))?;
    step("add(NaN)", add(&[Value::from(f64::NAN)]))
}

fn account(trace: &TraceSetting) -> Result<Value, ContractError> {
    fn adjust(this: &Value, delta: f64) -> Completion {
        let next = number(&this.get("balance")) + delta;
        match this.as_object() {
            Some(object) => {
                object.set("balance", next);
                Completion::returned(next)
            }
            None => Completion::raised(ContractError::operation("account method without a receiver")),
        }
    }

    let base = Class::builder("Account")
        .init(|this: &Object, _: &[Value]| {
            this.set("balance", 0);
            Ok(())
        })
        .method("deposit", |this: &Value, args: &[Value]| {
            adjust(this, args.first().map(number).unwrap_or(0.0))
        })
        .method("withdraw", |this: &Value, args: &[Value]| {
            adjust(this, -args.first().map(number).unwrap_or(0.0))
        })
        .getter("balance", |this: &Value| this.get("balance"))
        .build();
    let class = contract_class(
        &base,
        ContractRecord::new()
            .invariant(|this: &Value| number(&this.get("balance")) >= 0.0)
            .trace(trace.clone()),
    )?;

    let account = class.construct(&[])?;
    step("Account.deposit(50)", account.call("deposit", &[Value::from(50)]))?;
    let outcome = step("Account.withdraw(100)", account.call("withdraw", &[Value::from(100)]));
    println!("balance is {}", render(&account.get("balance")));
    outcome
}

fn deferred(trace: &TraceSetting) -> Result<Value, ContractError> {
    let contract = Contract::new(
        ContractRecord::new()
            .before(|args: &[Value]| {
                let held = args.first().is_some_and(|by| by.as_number().is_some());
                Check::pending(async move { held })
            })
            .invariant(|this: &Value| {
                let held = number(&this.get("value")) >= 0.0;
                Check::pending(async move { held })
            })
            .trace(trace.clone()),
    );
    let dec = contract.wrap_method(CallSite::new("Counter", "dec"), method(decrement));

    let this = Object::with_class("Counter");
    this.set("value", 1);
    step("Counter.dec(2)", dec(&Value::from(this), &[Value::from(2)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_names_are_unique() {
        for (i, scenario) in SCENARIOS.iter().enumerate() {
            assert!(SCENARIOS[i + 1..].iter().all(|other| other.name != scenario.name));
        }
    }

    #[test]
    fn find_by_name() {
        assert_eq!(find("account").map(|s| s.name), Some("account"));
        assert!(find("missing").is_none());
    }
}
