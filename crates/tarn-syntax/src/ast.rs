//! AST (abstract syntax tree) types for the Tarn language.
//!
//! The tree is plain data: it is built once by the parser and stays immutable
//! for the remainder of execution. Traversal sites (the evaluator, a token
//! printer, a future static checker) match exhaustively over the node enums.

use std::collections::HashMap;
use std::fmt;

use crate::token::Position;

/// The four primitive types of the language, used both as declared types and
/// as runtime value tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
        }
    }
}

/// Binary operators, highest precedence last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Expressions (literals, identifiers, operators, casts, calls).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral { value: i64, pos: Position },
    FloatLiteral { value: f64, pos: Position },
    BoolLiteral { value: bool, pos: Position },
    StringLiteral { value: String, pos: Position },
    Ident { name: String, pos: Position },
    Negate { operand: Box<Expr>, pos: Position },
    Cast { operand: Box<Expr>, target: Type, pos: Position },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr>, pos: Position },
    Call(CallExpr),
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::IntLiteral { pos, .. }
            | Expr::FloatLiteral { pos, .. }
            | Expr::BoolLiteral { pos, .. }
            | Expr::StringLiteral { pos, .. }
            | Expr::Ident { pos, .. }
            | Expr::Negate { pos, .. }
            | Expr::Cast { pos, .. }
            | Expr::Binary { pos, .. } => *pos,
            Expr::Call(call) => call.pos,
        }
    }
}

/// A function call, user-defined or embedded; resolution happens at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
    pub pos: Position,
}

/// `type name := expression`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    pub declared: Type,
    pub initializer: Expr,
    pub pos: Position,
}

/// Statements (bindings, control flow, returns).
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declaration(VariableDeclaration),
    Assignment {
        name: String,
        value: Expr,
        pos: Position,
    },
    /// A bare call or identifier whose value is discarded.
    Expression(Expr),
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
        pos: Position,
    },
    While {
        condition: Expr,
        body: Block,
        pos: Position,
    },
    Switch(SwitchStatement),
    Return {
        value: Option<Expr>,
        pos: Position,
    },
}

/// An ordered sequence of statements between braces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

/// `switch` over either guard declarations or a guard expression.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub guard: SwitchGuard,
    pub cases: Vec<SwitchCase>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchGuard {
    Declarations(Vec<VariableDeclaration>),
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub pattern: CasePattern,
    pub body: CaseBody,
    pub pos: Position,
}

/// The left side of a `=>` case: `default`, a relation against the subject,
/// or a bare expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CasePattern {
    Default,
    Relation(BinaryOp, Expr),
    Bare(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseBody {
    Expression(Expr),
    Block(Block),
}

/// Function parameter with its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub declared: Type,
    pub pos: Position,
}

/// Function definition; a missing return type means the function produces no
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<Type>,
    pub body: Block,
    pub pos: Position,
}

/// Entire program: function name to definition, names unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub functions: HashMap<String, FunctionDefinition>,
}
