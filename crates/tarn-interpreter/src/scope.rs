//! Scope arena and call-depth accounting for the Tarn interpreter.
//!
//! Scopes are arena-allocated and referenced by index; a scope's parent is an
//! optional index into the same arena. Children are always pushed after their
//! parents, so the evaluator can drop every scope created inside a block or a
//! call by truncating the arena back to its length at entry.

use std::collections::HashMap;

use crate::value::Value;
use tarn_syntax::ast::Type;
use tarn_syntax::error::{error_at, Result};
use tarn_syntax::token::Position;

/// Index of a scope in its [`ScopeArena`].
pub type ScopeId = usize;

/// A variable binding: its current value, its declared type, and the position
/// of the declaration. Every write keeps the value's tag equal to `declared`.
#[derive(Debug, Clone)]
pub struct ScopeVariable {
    pub value: Value,
    pub declared: Type,
    pub pos: Position,
}

#[derive(Debug, Clone, Copy)]
struct Boundary {
    return_type: Option<Type>,
}

#[derive(Debug)]
struct Scope {
    vars: HashMap<String, ScopeVariable>,
    parent: Option<ScopeId>,
    boundary: Option<Boundary>,
}

/// All scopes alive during one evaluation run.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live scopes; pair with [`truncate`](ScopeArena::truncate)
    /// to bound a scope's lifetime to a dynamic extent.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.scopes.truncate(len);
    }

    pub fn push_root(&mut self) -> ScopeId {
        self.push(None, None)
    }

    pub fn push_child(&mut self, parent: ScopeId) -> ScopeId {
        self.push(Some(parent), None)
    }

    /// A function-boundary scope: lookups and return-unwinding stop here.
    pub fn push_boundary(&mut self, parent: ScopeId, return_type: Option<Type>) -> ScopeId {
        self.push(Some(parent), Some(Boundary { return_type }))
    }

    fn push(&mut self, parent: Option<ScopeId>, boundary: Option<Boundary>) -> ScopeId {
        self.scopes.push(Scope {
            vars: HashMap::new(),
            parent,
            boundary,
        });
        self.scopes.len() - 1
    }

    /// Bind a new name in `scope`. A name may be declared at most once per
    /// scope; the error names the earlier declaration's position.
    pub fn declare(&mut self, scope: ScopeId, name: &str, var: ScopeVariable) -> Result<()> {
        if let Some(existing) = self.scopes[scope].vars.get(name) {
            return error_at(
                var.pos,
                format!(
                    "variable '{}' is already declared at {}",
                    name, existing.pos
                ),
            );
        }
        self.scopes[scope].vars.insert(name.to_string(), var);
        Ok(())
    }

    /// Resolve `name` by walking parent links, stopping at — but including —
    /// the first function-boundary scope.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&ScopeVariable> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(var) = scope.vars.get(name) {
                return Some(var);
            }
            if scope.boundary.is_some() {
                return None;
            }
            current = scope.parent;
        }
        None
    }

    /// Overwrite an existing binding, walking the chain like
    /// [`lookup`](ScopeArena::lookup). Fails on an unknown name or when the
    /// new value's tag differs from the declared type.
    pub fn assign(&mut self, scope: ScopeId, name: &str, value: Value, pos: Position) -> Result<()> {
        let mut current = Some(scope);
        let mut owner = None;
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if scope.vars.contains_key(name) {
                owner = Some(id);
                break;
            }
            if scope.boundary.is_some() {
                break;
            }
            current = scope.parent;
        }
        let id = match owner {
            Some(id) => id,
            None => return error_at(pos, format!("assignment to undefined variable '{}'", name)),
        };
        if let Some(var) = self.scopes[id].vars.get_mut(name) {
            if var.declared != value.tag() {
                return error_at(
                    pos,
                    format!(
                        "type mismatch: variable '{}' is declared {} but the value is {}",
                        name,
                        var.declared,
                        value.tag()
                    ),
                );
            }
            var.value = value;
        }
        Ok(())
    }

    /// Declared return type of the nearest enclosing function boundary.
    /// `None` means no boundary encloses `scope`; `Some(None)` is a boundary
    /// with no declared return value.
    pub fn return_type(&self, scope: ScopeId) -> Option<Option<Type>> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(boundary) = scope.boundary {
                return Some(boundary.return_type);
            }
            current = scope.parent;
        }
        None
    }
}

/// Per-function active-invocation counts, bounding runaway recursion.
#[derive(Debug)]
pub struct CallStack {
    active: HashMap<String, usize>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            active: HashMap::new(),
            max_depth,
        }
    }

    pub fn enter(&mut self, name: &str, pos: Position) -> Result<()> {
        let count = self.active.entry(name.to_string()).or_insert(0);
        if *count >= self.max_depth {
            return error_at(
                pos,
                format!(
                    "maximum recursion depth ({}) exceeded in function '{}'",
                    self.max_depth, name
                ),
            );
        }
        *count += 1;
        Ok(())
    }

    pub fn leave(&mut self, name: &str) {
        if let Some(count) = self.active.get_mut(name) {
            *count = count.saturating_sub(1);
        }
    }
}
