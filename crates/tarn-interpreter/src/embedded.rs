//! Embedded-function registry: natively provided callables invocable with
//! the same call syntax as user-defined functions.
//!
//! The registry is a value built once and passed to the interpreter at
//! construction, never ambient global state. An entry may produce at most
//! one value; `print`/`println` produce none.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::value::Value;
use tarn_syntax::error::{error, Error, Result};

/// Argument-count contract of an embedded function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variadic,
}

pub type EmbeddedFn = fn(&[Value]) -> Result<Option<Value>>;

#[derive(Clone)]
pub struct EmbeddedFunction {
    pub arity: Arity,
    pub func: EmbeddedFn,
}

#[derive(Clone)]
pub struct EmbeddedRegistry {
    entries: HashMap<String, EmbeddedFunction>,
}

impl EmbeddedRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The baseline registry: `print`, `println`, `modulo`, `sqrt`, `power`.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("print", Arity::Variadic, embedded_print);
        registry.register("println", Arity::Variadic, embedded_println);
        registry.register("modulo", Arity::Exact(2), embedded_modulo);
        registry.register("sqrt", Arity::Exact(1), embedded_sqrt);
        registry.register("power", Arity::Exact(2), embedded_power);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, arity: Arity, func: EmbeddedFn) {
        self.entries
            .insert(name.into(), EmbeddedFunction { arity, func });
    }

    pub fn get(&self, name: &str) -> Option<&EmbeddedFunction> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl Default for EmbeddedRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn render(args: &[Value]) -> String {
    let parts: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    parts.join(" ")
}

fn embedded_print(args: &[Value]) -> Result<Option<Value>> {
    print!("{}", render(args));
    io::stdout()
        .flush()
        .map_err(|e| Error::new(format!("io error: {}", e)))?;
    Ok(None)
}

fn embedded_println(args: &[Value]) -> Result<Option<Value>> {
    println!("{}", render(args));
    Ok(None)
}

// True exactly when the remainder is zero.
fn embedded_modulo(args: &[Value]) -> Result<Option<Value>> {
    match args {
        [Value::Int(_), Value::Int(0)] => error("modulo by zero"),
        [Value::Int(a), Value::Int(b)] => Ok(Some(Value::Bool(a % b == 0))),
        _ => error("modulo expects two int arguments"),
    }
}

fn embedded_sqrt(args: &[Value]) -> Result<Option<Value>> {
    match args {
        [Value::Float(x)] if *x < 0.0 => error("sqrt of a negative number"),
        [Value::Float(x)] => Ok(Some(Value::Float(x.sqrt()))),
        _ => error("sqrt expects a float argument"),
    }
}

fn embedded_power(args: &[Value]) -> Result<Option<Value>> {
    match args {
        [Value::Float(base), Value::Float(exp)] => Ok(Some(Value::Float(base.powf(*exp)))),
        _ => error("power expects two float arguments"),
    }
}
