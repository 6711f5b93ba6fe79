//! Tree-walking evaluator for Tarn programs.
//!
//! Expression evaluation is an ordinary value-returning recursive function;
//! statement execution returns a [`Flow`] that carries a pending return up
//! to the nearest function boundary. All state lives on one evaluator
//! instance; a failed run aborts and the instance is not reused.

use crate::embedded::{Arity, EmbeddedFunction, EmbeddedRegistry};
use crate::flow::Flow;
use crate::scope::{CallStack, ScopeArena, ScopeId, ScopeVariable};
use crate::value::Value;
use tarn_syntax::ast::*;
use tarn_syntax::error::{error, error_at, Error, Result};
use tarn_syntax::token::Position;

/// Default bound on active invocations per function name.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 128;

pub struct Interpreter {
    program: Program,
    embedded: EmbeddedRegistry,
    arena: ScopeArena,
    current: ScopeId,
    calls: CallStack,
}

impl Interpreter {
    pub fn new(program: Program, embedded: EmbeddedRegistry) -> Self {
        Self::with_max_depth(program, embedded, DEFAULT_MAX_RECURSION_DEPTH)
    }

    pub fn with_max_depth(
        program: Program,
        embedded: EmbeddedRegistry,
        max_depth: usize,
    ) -> Self {
        let mut arena = ScopeArena::new();
        let current = arena.push_root();
        Self {
            program,
            embedded,
            arena,
            current,
            calls: CallStack::new(max_depth),
        }
    }

    /// Run the program by invoking `main` with no arguments.
    pub fn run(&mut self) -> Result<Option<Value>> {
        if !self.program.functions.contains_key("main") {
            return error("program defines no 'main' function");
        }
        self.call_function("main", Vec::new(), Position::default())
    }

    /// Invoke a user-defined or embedded function by name. User definitions
    /// shadow registry entries.
    pub fn call_function(
        &mut self,
        name: &str,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Option<Value>> {
        if let Some(func) = self.program.functions.get(name) {
            let func = func.clone();
            return self.call_user(func, args, pos);
        }
        if let Some(entry) = self.embedded.get(name) {
            let entry = entry.clone();
            return self.call_embedded(name, &entry, args, pos);
        }
        error_at(pos, format!("undefined function '{}'", name))
    }

    fn call_user(
        &mut self,
        func: FunctionDefinition,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Option<Value>> {
        if args.len() != func.params.len() {
            return error_at(
                pos,
                format!(
                    "function '{}' expects {} argument(s), got {}",
                    func.name,
                    func.params.len(),
                    args.len()
                ),
            );
        }
        self.calls.enter(&func.name, pos)?;
        let mark = self.arena.len();
        let caller = self.current;
        let callee = self.arena.push_boundary(caller, func.return_type);
        for (param, value) in func.params.iter().zip(args) {
            if value.tag() != param.declared {
                return error_at(
                    pos,
                    format!(
                        "argument '{}' of '{}' expects {}, got {}",
                        param.name,
                        func.name,
                        param.declared,
                        value.tag()
                    ),
                );
            }
            self.arena.declare(
                callee,
                &param.name,
                ScopeVariable {
                    value,
                    declared: param.declared,
                    pos: param.pos,
                },
            )?;
        }
        self.current = callee;
        let flow = self.exec_block(&func.body)?;
        let value = match flow {
            Flow::Return(value) => value,
            Flow::Normal => None,
        };
        self.current = caller;
        self.arena.truncate(mark);
        self.calls.leave(&func.name);
        Ok(value)
    }

    fn call_embedded(
        &mut self,
        name: &str,
        entry: &EmbeddedFunction,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Option<Value>> {
        if let Arity::Exact(count) = entry.arity {
            if args.len() != count {
                return error_at(
                    pos,
                    format!(
                        "function '{}' expects {} argument(s), got {}",
                        name,
                        count,
                        args.len()
                    ),
                );
            }
        }
        (entry.func)(&args).map_err(|e| match e.pos {
            Some(_) => e,
            None => Error::at(e.msg, pos),
        })
    }

    // === statements ===

    fn exec_block(&mut self, block: &Block) -> Result<Flow> {
        for statement in &block.statements {
            if let Flow::Return(value) = self.exec_stmt(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    // Runs a block in a fresh child scope and drops every scope created
    // inside it, pending return included.
    fn exec_in_child(&mut self, block: &Block) -> Result<Flow> {
        let mark = self.arena.len();
        let outer = self.current;
        self.current = self.arena.push_child(outer);
        let flow = self.exec_block(block);
        self.current = outer;
        self.arena.truncate(mark);
        flow
    }

    fn exec_stmt(&mut self, statement: &Statement) -> Result<Flow> {
        match statement {
            Statement::Declaration(decl) => {
                self.exec_declaration(decl)?;
                Ok(Flow::Normal)
            }
            Statement::Assignment { name, value, pos } => {
                let value = self.eval_expr(value)?;
                self.arena.assign(self.current, name, value, *pos)?;
                Ok(Flow::Normal)
            }
            Statement::Expression(expr) => {
                self.eval_discard(expr)?;
                Ok(Flow::Normal)
            }
            Statement::If {
                condition,
                then_block,
                else_block,
                ..
            } => {
                let taken = if self.eval_bool(condition, "if condition")? {
                    Some(then_block)
                } else {
                    else_block.as_ref()
                };
                match taken {
                    Some(block) => self.exec_in_child(block),
                    None => Ok(Flow::Normal),
                }
            }
            Statement::While {
                condition, body, ..
            } => {
                // One child scope, reused across all iterations.
                let mark = self.arena.len();
                let outer = self.current;
                self.current = self.arena.push_child(outer);
                let mut flow = Flow::Normal;
                loop {
                    if !self.eval_bool(condition, "while condition")? {
                        break;
                    }
                    if let Flow::Return(value) = self.exec_block(body)? {
                        flow = Flow::Return(value);
                        break;
                    }
                }
                self.current = outer;
                self.arena.truncate(mark);
                Ok(flow)
            }
            Statement::Switch(switch) => self.exec_switch(switch),
            Statement::Return { value, pos } => {
                let value = match value {
                    Some(expr) => Some(self.eval_expr(expr)?),
                    None => None,
                };
                let declared = match self.arena.return_type(self.current) {
                    Some(declared) => declared,
                    None => return error_at(*pos, "'return' outside of a function"),
                };
                match (&value, declared) {
                    (None, None) => {}
                    (Some(v), Some(t)) if v.tag() == t => {}
                    (Some(v), Some(t)) => {
                        return error_at(
                            *pos,
                            format!(
                                "invalid return type: function declares {}, got {}",
                                t,
                                v.tag()
                            ),
                        )
                    }
                    (Some(v), None) => {
                        return error_at(
                            *pos,
                            format!(
                                "invalid return type: function declares no return value, got {}",
                                v.tag()
                            ),
                        )
                    }
                    (None, Some(t)) => {
                        return error_at(
                            *pos,
                            format!("invalid return type: function declares {}, got no value", t),
                        )
                    }
                }
                Ok(Flow::Return(value))
            }
        }
    }

    fn exec_declaration(&mut self, decl: &VariableDeclaration) -> Result<()> {
        let value = self.eval_expr(&decl.initializer)?;
        if value.tag() != decl.declared {
            return error_at(
                decl.pos,
                format!(
                    "type mismatch: '{}' is declared {} but the initializer is {}",
                    decl.name,
                    decl.declared,
                    value.tag()
                ),
            );
        }
        self.arena.declare(
            self.current,
            &decl.name,
            ScopeVariable {
                value,
                declared: decl.declared,
                pos: decl.pos,
            },
        )
    }

    fn exec_switch(&mut self, switch: &SwitchStatement) -> Result<Flow> {
        let mark = self.arena.len();
        let outer = self.current;
        self.current = self.arena.push_child(outer);
        let flow = self.run_switch(switch);
        self.current = outer;
        self.arena.truncate(mark);
        flow
    }

    // Guard declarations bind into the switch scope; a guard expression (or
    // a single guard declaration's value) becomes the subject the cases
    // compare against.
    fn run_switch(&mut self, switch: &SwitchStatement) -> Result<Flow> {
        let subject = match &switch.guard {
            SwitchGuard::Expression(expr) => Some(self.eval_expr(expr)?),
            SwitchGuard::Declarations(decls) => {
                for decl in decls {
                    self.exec_declaration(decl)?;
                }
                match decls.as_slice() {
                    [only] => self
                        .arena
                        .lookup(self.current, &only.name)
                        .map(|var| var.value.clone()),
                    _ => None,
                }
            }
        };
        let mut default_case = None;
        for case in &switch.cases {
            if matches!(case.pattern, CasePattern::Default) {
                if default_case.is_some() {
                    return error_at(case.pos, "switch has more than one default case");
                }
                default_case = Some(case);
            }
        }
        for case in &switch.cases {
            let matched = match &case.pattern {
                CasePattern::Default => false,
                CasePattern::Relation(op, expr) => {
                    let subject = match subject.clone() {
                        Some(subject) => subject,
                        None => {
                            return error_at(
                                case.pos,
                                "a relational case requires a switch subject",
                            )
                        }
                    };
                    let rhs = self.eval_expr(expr)?;
                    matches!(
                        self.apply_binary(*op, subject, rhs, case.pos)?,
                        Value::Bool(true)
                    )
                }
                CasePattern::Bare(expr) => {
                    let rhs = self.eval_expr(expr)?;
                    match subject.clone() {
                        Some(subject) => Self::values_equal(subject, rhs, case.pos)?,
                        None => match rhs {
                            Value::Bool(matched) => matched,
                            other => {
                                return error_at(
                                    case.pos,
                                    format!("switch case must be bool, got {}", other.tag()),
                                )
                            }
                        },
                    }
                }
            };
            if matched {
                return self.run_case_body(&case.body);
            }
        }
        match default_case {
            Some(case) => self.run_case_body(&case.body),
            None => Ok(Flow::Normal),
        }
    }

    fn run_case_body(&mut self, body: &CaseBody) -> Result<Flow> {
        match body {
            CaseBody::Block(block) => self.exec_in_child(block),
            CaseBody::Expression(expr) => {
                self.eval_discard(expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    // === expressions ===

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::IntLiteral { value, .. } => Ok(Value::Int(*value)),
            Expr::FloatLiteral { value, .. } => Ok(Value::Float(*value)),
            Expr::BoolLiteral { value, .. } => Ok(Value::Bool(*value)),
            Expr::StringLiteral { value, .. } => Ok(Value::Str(value.clone())),
            Expr::Ident { name, pos } => match self.arena.lookup(self.current, name) {
                Some(var) => Ok(var.value.clone()),
                None => error_at(*pos, format!("undefined variable '{}'", name)),
            },
            Expr::Negate { operand, pos } => match self.eval_expr(operand)? {
                Value::Int(n) => Ok(Value::Int(-n)),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => error_at(*pos, format!("cannot negate {}", other.tag())),
            },
            Expr::Cast {
                operand,
                target,
                pos,
            } => {
                let value = self.eval_expr(operand)?;
                Self::eval_cast(value, *target, *pos)
            }
            Expr::Binary { op, lhs, rhs, pos } => self.eval_binary(*op, lhs, rhs, *pos),
            Expr::Call(call) => match self.eval_call(call)? {
                Some(value) => Ok(value),
                None => error_at(
                    call.pos,
                    format!("function '{}' produced no value", call.name),
                ),
            },
        }
    }

    // Statement position: the value, if any, is dropped.
    fn eval_discard(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Call(call) => {
                self.eval_call(call)?;
            }
            other => {
                self.eval_expr(other)?;
            }
        }
        Ok(())
    }

    // Arguments are evaluated in the caller's scope, before the callee scope
    // exists.
    fn eval_call(&mut self, call: &CallExpr) -> Result<Option<Value>> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expr(arg)?);
        }
        self.call_function(&call.name, args, call.pos)
    }

    fn eval_bool(&mut self, expr: &Expr, what: &str) -> Result<bool> {
        match self.eval_expr(expr)? {
            Value::Bool(b) => Ok(b),
            other => error_at(
                expr.pos(),
                format!("{} must be bool, got {}", what, other.tag()),
            ),
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, pos: Position) -> Result<Value> {
        match op {
            BinaryOp::And => {
                match self.eval_expr(lhs)? {
                    Value::Bool(false) => return Ok(Value::Bool(false)),
                    Value::Bool(true) => {}
                    other => {
                        return error_at(
                            pos,
                            format!("'and' expects bool operands, got {}", other.tag()),
                        )
                    }
                }
                match self.eval_expr(rhs)? {
                    Value::Bool(b) => Ok(Value::Bool(b)),
                    other => error_at(
                        pos,
                        format!("'and' expects bool operands, got {}", other.tag()),
                    ),
                }
            }
            BinaryOp::Or => {
                match self.eval_expr(lhs)? {
                    Value::Bool(true) => return Ok(Value::Bool(true)),
                    Value::Bool(false) => {}
                    other => {
                        return error_at(
                            pos,
                            format!("'or' expects bool operands, got {}", other.tag()),
                        )
                    }
                }
                match self.eval_expr(rhs)? {
                    Value::Bool(b) => Ok(Value::Bool(b)),
                    other => error_at(
                        pos,
                        format!("'or' expects bool operands, got {}", other.tag()),
                    ),
                }
            }
            _ => {
                let lhs = self.eval_expr(lhs)?;
                let rhs = self.eval_expr(rhs)?;
                self.apply_binary(op, lhs, rhs, pos)
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, lhs: Value, rhs: Value, pos: Position) -> Result<Value> {
        match op {
            BinaryOp::Add => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
                (a, b) => Self::operand_mismatch("+", a, b, pos),
            },
            BinaryOp::Sub => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
                (a, b) => Self::operand_mismatch("-", a, b, pos),
            },
            BinaryOp::Mul => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
                (a, b) => Self::operand_mismatch("*", a, b, pos),
            },
            BinaryOp::Div => match (lhs, rhs) {
                // The divisor is checked before any computation happens.
                (Value::Int(_), Value::Int(0)) => error_at(pos, "division by zero"),
                (Value::Float(_), Value::Float(b)) if b == 0.0 => {
                    error_at(pos, "division by zero")
                }
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a / b)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
                (a, b) => Self::operand_mismatch("/", a, b, pos),
            },
            BinaryOp::Eq => Self::values_equal(lhs, rhs, pos).map(Value::Bool),
            BinaryOp::NotEq => Self::values_equal(lhs, rhs, pos).map(|eq| Value::Bool(!eq)),
            BinaryOp::Greater => Self::compare(op, lhs, rhs, pos, |o| o.is_gt()),
            BinaryOp::GreaterEq => Self::compare(op, lhs, rhs, pos, |o| o.is_ge()),
            BinaryOp::Less => Self::compare(op, lhs, rhs, pos, |o| o.is_lt()),
            BinaryOp::LessEq => Self::compare(op, lhs, rhs, pos, |o| o.is_le()),
            BinaryOp::Or | BinaryOp::And => {
                error_at(pos, "internal error: logical operator outside short-circuit path")
            }
        }
    }

    // Equality requires identical tags, then compares by value.
    fn values_equal(lhs: Value, rhs: Value, pos: Position) -> Result<bool> {
        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (Value::Float(a), Value::Float(b)) => Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (a, b) => error_at(
                pos,
                format!("cannot compare {} and {}", a.tag(), b.tag()),
            ),
        }
    }

    // Relational operators support int and float only.
    fn compare(
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        pos: Position,
        accept: fn(std::cmp::Ordering) -> bool,
    ) -> Result<Value> {
        let ordering = match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => {
                a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Less)
            }
            _ => return Self::operand_mismatch(op.symbol(), lhs, rhs, pos),
        };
        Ok(Value::Bool(accept(ordering)))
    }

    fn operand_mismatch(symbol: &str, lhs: Value, rhs: Value, pos: Position) -> Result<Value> {
        error_at(
            pos,
            format!(
                "operator '{}' cannot combine {} and {}",
                symbol,
                lhs.tag(),
                rhs.tag()
            ),
        )
    }

    fn eval_cast(value: Value, target: Type, pos: Position) -> Result<Value> {
        match (value, target) {
            (value, Type::String) => Ok(Value::Str(value.to_string())),
            (Value::Int(n), Type::Int) => Ok(Value::Int(n)),
            (Value::Float(x), Type::Int) => Ok(Value::Int(x.trunc() as i64)),
            (Value::Bool(b), Type::Int) => Ok(Value::Int(if b { 1 } else { 0 })),
            (Value::Str(s), Type::Int) => match s.parse::<i64>() {
                Ok(n) => Ok(Value::Int(n)),
                Err(_) => error_at(pos, format!("cannot cast \"{}\" to int", s)),
            },
            (Value::Int(n), Type::Float) => Ok(Value::Float(n as f64)),
            (Value::Float(x), Type::Float) => Ok(Value::Float(x)),
            (Value::Bool(b), Type::Float) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
            (Value::Str(s), Type::Float) => match s.parse::<f64>() {
                Ok(x) => Ok(Value::Float(x)),
                Err(_) => error_at(pos, format!("cannot cast \"{}\" to float", s)),
            },
            (Value::Int(n), Type::Bool) => Ok(Value::Bool(n != 0)),
            (Value::Float(x), Type::Bool) => Ok(Value::Bool(x != 0.0)),
            (Value::Bool(b), Type::Bool) => Ok(Value::Bool(b)),
            (Value::Str(s), Type::Bool) => match s.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => error_at(pos, format!("cannot cast \"{}\" to bool", s)),
            },
        }
    }
}
