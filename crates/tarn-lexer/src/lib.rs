//! Tarn lexer: converts source text into position-annotated tokens.
//!
//! Newlines, end-of-input, and comments are emitted as tokens (`Eol`, `Etx`,
//! `Comment`) rather than swallowed; the parser's token cursor skips the ones
//! it does not care about. Capacity limits for identifiers, strings, and
//! numeric literals are injected at construction.

mod scanner;

pub use scanner::Scanner;

use tarn_syntax::error::{error_at, Result};
use tarn_syntax::token::{Position, Token, TokenKind};

/// Capacity limits enforced while lexing. All values must be positive.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum identifier length in runes.
    pub identifier: usize,
    /// Maximum string literal length in runes.
    pub string: usize,
    /// Maximum magnitude of an int literal and of either part of a float
    /// literal.
    pub int: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            identifier: 128,
            string: 4096,
            int: i64::MAX,
        }
    }
}

/// Streaming lexer producing one token per [`next_token`] call.
///
/// [`next_token`]: Lexer::next_token
pub struct Lexer {
    scanner: Scanner,
    limits: Limits,
}

impl Lexer {
    /// Create a new lexer over the given source string with default limits.
    pub fn new(input: &str) -> Self {
        Self::with_limits(input, Limits::default())
    }

    pub fn with_limits(input: &str, limits: Limits) -> Self {
        Self {
            scanner: Scanner::new(input),
            limits,
        }
    }

    /// Produce the next token. Errors are terminal for this call and carry
    /// the position of the violation. After the input is exhausted every
    /// further call returns `Etx`.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_blank();
        let pos = self.scanner.position();
        let c = match self.scanner.current() {
            Some(c) => c,
            None => {
                return Ok(Token {
                    kind: TokenKind::Etx,
                    pos,
                })
            }
        };
        if c == '\n' {
            self.scanner.advance();
            return Ok(Token {
                kind: TokenKind::Eol,
                pos,
            });
        }
        if c == '#' {
            return self.read_comment(pos);
        }
        if c == '"' {
            self.scanner.advance();
            return self.read_string(pos);
        }
        if let Some(token) = self.read_operator(pos)? {
            return Ok(token);
        }
        if c.is_ascii_digit() {
            return self.read_number(pos);
        }
        if c.is_alphabetic() {
            return self.read_ident_or_keyword(pos);
        }
        error_at(pos, format!("no token matches '{}'", c))
    }

    /// Tokenize the entire input into a vector of tokens ending with `Etx`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Etx;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn skip_blank(&mut self) {
        while let Some(c) = self.scanner.current() {
            if c.is_whitespace() && c != '\n' {
                self.scanner.advance();
            } else {
                break;
            }
        }
    }

    fn read_comment(&mut self, pos: Position) -> Result<Token> {
        self.scanner.advance();
        let mut text = String::new();
        while let Some(c) = self.scanner.current() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.scanner.advance();
        }
        Ok(Token {
            kind: TokenKind::Comment(text),
            pos,
        })
    }

    fn read_string(&mut self, pos: Position) -> Result<Token> {
        let mut s = String::new();
        let mut len = 0usize;
        loop {
            let c = match self.scanner.advance() {
                Some(c) => c,
                None => return error_at(pos, "string literal is never closed"),
            };
            let rune = match c {
                '"' => {
                    return Ok(Token {
                        kind: TokenKind::Str(s),
                        pos,
                    })
                }
                '\\' => match self.scanner.advance() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('"') => '"',
                    Some('\\') => '\\',
                    Some(other) => other,
                    None => return error_at(pos, "string literal is never closed"),
                },
                other => other,
            };
            len += 1;
            if len > self.limits.string {
                return error_at(pos, "string literal exceeds capacity");
            }
            s.push(rune);
        }
    }

    fn read_operator(&mut self, pos: Position) -> Result<Option<Token>> {
        let c = match self.scanner.current() {
            Some(c) => c,
            None => return Ok(None),
        };
        // Leading runes that can start a two-rune operator check the
        // two-rune table first, then fall back to the single-rune table.
        if matches!(c, '<' | '>' | '=' | '!' | '-' | ':') {
            self.scanner.advance();
            let two = match (c, self.scanner.current()) {
                ('<', Some('=')) => Some(TokenKind::LessEq),
                ('>', Some('=')) => Some(TokenKind::GreaterEq),
                ('=', Some('=')) => Some(TokenKind::EqEq),
                ('=', Some('>')) => Some(TokenKind::FatArrow),
                ('!', Some('=')) => Some(TokenKind::NotEq),
                ('-', Some('>')) => Some(TokenKind::CastArrow),
                (':', Some('=')) => Some(TokenKind::Declare),
                _ => None,
            };
            if let Some(kind) = two {
                self.scanner.advance();
                return Ok(Some(Token { kind, pos }));
            }
            let single = match c {
                '<' => Some(TokenKind::Less),
                '>' => Some(TokenKind::Greater),
                '=' => Some(TokenKind::Assign),
                '-' => Some(TokenKind::Minus),
                _ => None,
            };
            return match single {
                Some(kind) => Ok(Some(Token { kind, pos })),
                None => error_at(pos, format!("no token matches '{}'", c)),
            };
        }
        let kind = match c {
            '+' => TokenKind::Plus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            _ => return Ok(None),
        };
        self.scanner.advance();
        Ok(Some(Token { kind, pos }))
    }

    fn read_number(&mut self, pos: Position) -> Result<Token> {
        let limit = self.limits.int;
        let mut value: i64 = 0;
        while let Some(d) = self.scanner.current().and_then(|c| c.to_digit(10)) {
            let d = d as i64;
            // The guard runs before the multiply-add so the accumulator can
            // never wrap.
            if value > (limit - d) / 10 {
                return error_at(pos, "int literal exceeds capacity");
            }
            value = value * 10 + d;
            self.scanner.advance();
        }
        if self.scanner.current() != Some('.') {
            return Ok(Token {
                kind: TokenKind::Int(value),
                pos,
            });
        }
        self.scanner.advance();
        let mut fraction: i64 = 0;
        let mut digits = 0i32;
        while let Some(d) = self.scanner.current().and_then(|c| c.to_digit(10)) {
            let d = d as i64;
            if fraction > (limit - d) / 10 {
                return error_at(pos, "float literal exceeds capacity");
            }
            fraction = fraction * 10 + d;
            digits += 1;
            self.scanner.advance();
        }
        let value = value as f64 + fraction as f64 / 10f64.powi(digits);
        Ok(Token {
            kind: TokenKind::Float(value),
            pos,
        })
    }

    fn read_ident_or_keyword(&mut self, pos: Position) -> Result<Token> {
        let mut s = String::new();
        let mut len = 0usize;
        while let Some(c) = self.scanner.current() {
            if c.is_alphanumeric() || c == '_' {
                len += 1;
                if len > self.limits.identifier {
                    return error_at(pos, "identifier exceeds capacity");
                }
                s.push(c);
                self.scanner.advance();
            } else {
                break;
            }
        }
        let kind = match s.as_str() {
            "int" => TokenKind::TypeInt,
            "float" => TokenKind::TypeFloat,
            "bool" => TokenKind::TypeBool,
            "string" => TokenKind::TypeString,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "switch" => TokenKind::Switch,
            "default" => TokenKind::Default,
            "return" => TokenKind::Return,
            "or" => TokenKind::Or,
            "and" => TokenKind::And,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => TokenKind::Ident(s),
        };
        Ok(Token { kind, pos })
    }
}
