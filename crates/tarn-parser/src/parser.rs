//! Single-token-lookahead recursive descent over the lexer's token stream.
//!
//! Each production either returns `Ok(Some(node))`, returns `Ok(None)` when
//! the current token cannot start it, or fails once it has committed —
//! consumed a token that uniquely identifies the production — and a required
//! token is missing. The first error wins; there is no recovery.

use std::collections::HashMap;

use tarn_syntax::ast::*;
use tarn_syntax::error::{error_at, Result};
use tarn_syntax::token::{Position, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    /// Create a parser over a token vector ending with `Etx` (the shape
    /// `Lexer::tokenize` produces).
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens;
        if tokens.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Etx,
                pos: Position::default(),
            });
        }
        let mut parser = Self { tokens, cursor: 0 };
        parser.skip_trivia();
        parser
    }

    /// Parse a whole program: function definitions followed by end of input.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut functions: HashMap<String, FunctionDefinition> = HashMap::new();
        while let Some(func) = self.parse_function_definition()? {
            if let Some(first) = functions.get(&func.name) {
                return error_at(
                    func.pos,
                    format!(
                        "function '{}' is already defined at {}",
                        func.name, first.pos
                    ),
                );
            }
            functions.insert(func.name.clone(), func);
        }
        if self.current().kind != TokenKind::Etx {
            let token = self.current();
            return error_at(
                token.pos,
                format!("expected end of input, found {}", token.kind),
            );
        }
        Ok(Program { functions })
    }

    /// Parse a single expression; exposed for unit tests and tooling.
    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expression_required("at start of expression")
    }

    // === token cursor ===

    fn current(&self) -> &Token {
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Etx {
            self.cursor += 1;
            self.skip_trivia();
        }
        token
    }

    // Comments and newlines are insignificant to the grammar; the cursor
    // never exposes them.
    fn skip_trivia(&mut self) {
        while self.cursor < self.tokens.len()
            && matches!(
                self.tokens[self.cursor].kind,
                TokenKind::Comment(_) | TokenKind::Eol
            )
        {
            self.cursor += 1;
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            let token = self.current();
            error_at(
                token.pos,
                format!("expected {} {}, found {}", kind, context, token.kind),
            )
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<(String, Position)> {
        match &self.current().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let pos = self.current().pos;
                self.advance();
                Ok((name, pos))
            }
            other => {
                let msg = format!("expected an identifier {}, found {}", context, other);
                error_at(self.current().pos, msg)
            }
        }
    }

    // === declarations ===

    fn parse_function_definition(&mut self) -> Result<Option<FunctionDefinition>> {
        let (name, pos) = match &self.current().kind {
            TokenKind::Ident(name) => (name.clone(), self.current().pos),
            _ => return Ok(None),
        };
        self.advance();
        self.expect(TokenKind::LParen, "after function name")?;
        let params = if self.current().kind == TokenKind::RParen {
            Vec::new()
        } else {
            self.parse_parameters()?
        };
        self.expect(TokenKind::RParen, "after parameters")?;
        let return_type = self.parse_type_annotation();
        let body = self.parse_block()?;
        Ok(Some(FunctionDefinition {
            name,
            params,
            return_type,
            body,
            pos,
        }))
    }

    fn parse_type_annotation(&mut self) -> Option<Type> {
        let ty = match self.current().kind {
            TokenKind::TypeInt => Type::Int,
            TokenKind::TypeFloat => Type::Float,
            TokenKind::TypeBool => Type::Bool,
            TokenKind::TypeString => Type::String,
            _ => return None,
        };
        self.advance();
        Some(ty)
    }

    // Parameter groups share one trailing type annotation: `a, b int, c bool`.
    fn parse_parameters(&mut self) -> Result<Vec<Parameter>> {
        let mut params = Vec::new();
        let mut pending: Vec<(String, Position)> = Vec::new();
        loop {
            let (name, pos) = self.expect_ident("as a parameter name")?;
            pending.push((name, pos));
            if let Some(declared) = self.parse_type_annotation() {
                for (name, pos) in pending.drain(..) {
                    params.push(Parameter {
                        name,
                        declared,
                        pos,
                    });
                }
                if self.eat(&TokenKind::Comma) {
                    continue;
                }
                return Ok(params);
            }
            self.expect(TokenKind::Comma, "or a type annotation after parameter name")?;
        }
    }

    // === statements ===

    fn parse_block(&mut self) -> Result<Block> {
        self.expect(TokenKind::LBrace, "to open a block")?;
        let mut statements = Vec::new();
        while let Some(statement) = self.parse_statement()? {
            statements.push(statement);
        }
        self.expect(TokenKind::RBrace, "to close a block")?;
        Ok(Block { statements })
    }

    fn parse_statement(&mut self) -> Result<Option<Statement>> {
        match self.current().kind {
            TokenKind::TypeInt
            | TokenKind::TypeFloat
            | TokenKind::TypeBool
            | TokenKind::TypeString => {
                let decl = self.parse_variable_declaration()?;
                Ok(Some(Statement::Declaration(decl)))
            }
            TokenKind::Ident(_) => self.parse_assignment_or_call().map(Some),
            TokenKind::If => self.parse_conditional().map(Some),
            TokenKind::While => self.parse_loop().map(Some),
            TokenKind::Switch => self.parse_switch().map(Some),
            TokenKind::Return => self.parse_return().map(Some),
            _ => Ok(None),
        }
    }

    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration> {
        let pos = self.current().pos;
        let declared = match self.parse_type_annotation() {
            Some(ty) => ty,
            None => return error_at(pos, "expected a type annotation"),
        };
        let (name, _) = self.expect_ident("after the type annotation")?;
        self.expect(TokenKind::Declare, "after the variable name")?;
        let initializer = self.parse_expression_required("after ':='")?;
        Ok(VariableDeclaration {
            name,
            declared,
            initializer,
            pos,
        })
    }

    fn parse_assignment_or_call(&mut self) -> Result<Statement> {
        let (name, pos) = self.expect_ident("at start of statement")?;
        if self.current().kind == TokenKind::LParen {
            let call = self.parse_call_arguments(name, pos)?;
            if self.current().kind == TokenKind::Assign {
                return error_at(
                    self.current().pos,
                    "cannot assign to the result of a call",
                );
            }
            return Ok(Statement::Expression(Expr::Call(call)));
        }
        if self.eat(&TokenKind::Assign) {
            let value = self.parse_expression_required("after '='")?;
            return Ok(Statement::Assignment { name, value, pos });
        }
        Ok(Statement::Expression(Expr::Ident { name, pos }))
    }

    fn parse_conditional(&mut self) -> Result<Statement> {
        let pos = self.advance().pos;
        let condition = self.parse_expression_required("after 'if'")?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_block,
            else_block,
            pos,
        })
    }

    fn parse_loop(&mut self) -> Result<Statement> {
        let pos = self.advance().pos;
        let condition = self.parse_expression_required("after 'while'")?;
        let body = self.parse_block()?;
        Ok(Statement::While {
            condition,
            body,
            pos,
        })
    }

    fn parse_switch(&mut self) -> Result<Statement> {
        let pos = self.advance().pos;
        let guard = if matches!(
            self.current().kind,
            TokenKind::TypeInt | TokenKind::TypeFloat | TokenKind::TypeBool | TokenKind::TypeString
        ) {
            let mut declarations = vec![self.parse_variable_declaration()?];
            while self.eat(&TokenKind::Comma) {
                declarations.push(self.parse_variable_declaration()?);
            }
            SwitchGuard::Declarations(declarations)
        } else {
            SwitchGuard::Expression(self.parse_expression_required("after 'switch'")?)
        };
        self.expect(TokenKind::LBrace, "to open the switch body")?;
        let mut cases = vec![self.parse_switch_case()?];
        while self.eat(&TokenKind::Comma) {
            cases.push(self.parse_switch_case()?);
        }
        self.expect(TokenKind::RBrace, "to close the switch body")?;
        Ok(Statement::Switch(SwitchStatement { guard, cases, pos }))
    }

    fn parse_switch_case(&mut self) -> Result<SwitchCase> {
        let pos = self.current().pos;
        let pattern = if self.eat(&TokenKind::Default) {
            CasePattern::Default
        } else if let Some(op) = self.relation_operator() {
            self.advance();
            let expr = self.parse_expression_required("after the relation operator")?;
            CasePattern::Relation(op, expr)
        } else {
            CasePattern::Bare(self.parse_expression_required("as a switch case")?)
        };
        self.expect(TokenKind::FatArrow, "after the case pattern")?;
        let body = if self.current().kind == TokenKind::LBrace {
            CaseBody::Block(self.parse_block()?)
        } else {
            CaseBody::Expression(self.parse_expression_required("after '=>'")?)
        };
        Ok(SwitchCase { pattern, body, pos })
    }

    fn relation_operator(&self) -> Option<BinaryOp> {
        match self.current().kind {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            TokenKind::Greater => Some(BinaryOp::Greater),
            TokenKind::GreaterEq => Some(BinaryOp::GreaterEq),
            TokenKind::Less => Some(BinaryOp::Less),
            TokenKind::LessEq => Some(BinaryOp::LessEq),
            _ => None,
        }
    }

    fn parse_return(&mut self) -> Result<Statement> {
        let pos = self.advance().pos;
        let value = self.parse_expression()?;
        Ok(Statement::Return { value, pos })
    }

    // === expressions ===

    fn parse_expression_required(&mut self, context: &str) -> Result<Expr> {
        match self.parse_expression()? {
            Some(expr) => Ok(expr),
            None => {
                let token = self.current();
                error_at(
                    token.pos,
                    format!("expected an expression {}, found {}", context, token.kind),
                )
            }
        }
    }

    fn parse_expression(&mut self) -> Result<Option<Expr>> {
        let mut lhs = match self.parse_conjunction()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        while self.current().kind == TokenKind::Or {
            let pos = self.advance().pos;
            let rhs = self.require_after(Self::parse_conjunction, "after 'or'")?;
            lhs = binary(BinaryOp::Or, lhs, rhs, pos);
        }
        Ok(Some(lhs))
    }

    fn parse_conjunction(&mut self) -> Result<Option<Expr>> {
        let mut lhs = match self.parse_relation()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        while self.current().kind == TokenKind::And {
            let pos = self.advance().pos;
            let rhs = self.require_after(Self::parse_relation, "after 'and'")?;
            lhs = binary(BinaryOp::And, lhs, rhs, pos);
        }
        Ok(Some(lhs))
    }

    // Comparisons do not chain: `a < b < c` parses as `(a < b)` followed by
    // a trailing `< c`, which the caller rejects.
    fn parse_relation(&mut self) -> Result<Option<Expr>> {
        let lhs = match self.parse_additive()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        if let Some(op) = self.relation_operator() {
            let pos = self.advance().pos;
            let rhs = self.require_after(Self::parse_additive, "after the comparison operator")?;
            return Ok(Some(binary(op, lhs, rhs, pos)));
        }
        Ok(Some(lhs))
    }

    fn parse_additive(&mut self) -> Result<Option<Expr>> {
        let mut lhs = match self.parse_multiplicative()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(Some(lhs)),
            };
            let pos = self.advance().pos;
            let rhs = self.require_after(Self::parse_multiplicative, "after the operator")?;
            lhs = binary(op, lhs, rhs, pos);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Option<Expr>> {
        let mut lhs = match self.parse_unary()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => return Ok(Some(lhs)),
            };
            let pos = self.advance().pos;
            let rhs = self.require_after(Self::parse_unary, "after the operator")?;
            lhs = binary(op, lhs, rhs, pos);
        }
    }

    fn parse_unary(&mut self) -> Result<Option<Expr>> {
        if self.current().kind == TokenKind::Minus {
            let pos = self.advance().pos;
            let operand = self.require_after(Self::parse_cast, "after unary '-'")?;
            return Ok(Some(Expr::Negate {
                operand: Box::new(operand),
                pos,
            }));
        }
        self.parse_cast()
    }

    fn parse_cast(&mut self) -> Result<Option<Expr>> {
        let mut expr = match self.parse_factor()? {
            Some(expr) => expr,
            None => return Ok(None),
        };
        while self.current().kind == TokenKind::CastArrow {
            let pos = self.advance().pos;
            let target = match self.parse_type_annotation() {
                Some(ty) => ty,
                None => {
                    let token = self.current();
                    return error_at(
                        token.pos,
                        format!("expected a type annotation after '->', found {}", token.kind),
                    );
                }
            };
            expr = Expr::Cast {
                operand: Box::new(expr),
                target,
                pos,
            };
        }
        Ok(Some(expr))
    }

    fn parse_factor(&mut self) -> Result<Option<Expr>> {
        let pos = self.current().pos;
        let expr = match self.current().kind.clone() {
            TokenKind::Int(value) => {
                self.advance();
                Expr::IntLiteral { value, pos }
            }
            TokenKind::Float(value) => {
                self.advance();
                Expr::FloatLiteral { value, pos }
            }
            TokenKind::Bool(value) => {
                self.advance();
                Expr::BoolLiteral { value, pos }
            }
            TokenKind::Str(value) => {
                self.advance();
                Expr::StringLiteral { value, pos }
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.current().kind == TokenKind::LParen {
                    Expr::Call(self.parse_call_arguments(name, pos)?)
                } else {
                    Expr::Ident { name, pos }
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression_required("after '('")?;
                self.expect(TokenKind::RParen, "to close the expression")?;
                expr
            }
            _ => return Ok(None),
        };
        Ok(Some(expr))
    }

    fn parse_call_arguments(&mut self, name: String, pos: Position) -> Result<CallExpr> {
        self.expect(TokenKind::LParen, "after function name")?;
        let mut args = Vec::new();
        if self.current().kind != TokenKind::RParen {
            loop {
                args.push(self.parse_expression_required("in the argument list")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "to close the argument list")?;
        Ok(CallExpr { name, args, pos })
    }

    fn require_after(
        &mut self,
        production: fn(&mut Self) -> Result<Option<Expr>>,
        context: &str,
    ) -> Result<Expr> {
        match production(self)? {
            Some(expr) => Ok(expr),
            None => {
                let token = self.current();
                error_at(
                    token.pos,
                    format!("expected an expression {}, found {}", context, token.kind),
                )
            }
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, pos: Position) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        pos,
    }
}
