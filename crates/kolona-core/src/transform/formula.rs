//! Single-variable arithmetic formulas.
//!
//! A formula is parsed into a small expression tree whose only leaves are
//! numeric literals and the variable `x`. There is no name lookup, call,
//! attribute or string syntax at all, so nothing but arithmetic can be
//! expressed. Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary (('**' | '^') unary)?
//! primary := NUMBER | 'x' | '(' expr ')'
//! ```
//!
//! Numbers accept "." or "," as the decimal separator and an optional
//! exponent (`1e3`). `×` and `÷` are accepted for `*` and `/`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use std::fmt;
use std::str::FromStr;

/// Name of the only variable a formula may reference.
pub const VARIABLE: &str = "x";

/// Maximum nesting of parentheses, unary signs and powers.
const MAX_DEPTH: usize = 64;
/// Maximum number of tokens in one formula.
const MAX_TOKENS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalFailure {
    #[error("syntax error at character {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("'{0}' is not defined (only {VARIABLE} may be used)")]
    UnknownName(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("power is undefined for these operands")]
    InvalidPower,
}

impl EvalFailure {
    fn parse(position: usize, message: impl Into<String>) -> Self {
        EvalFailure::Parse {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Number(Decimal),
    Var,
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

/// A parsed, immutable formula over `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Formula, EvalFailure> {
        let tokens = Lexer::new(source).tokenize()?;
        if tokens.len() > MAX_TOKENS {
            return Err(EvalFailure::parse(
                0,
                format!("formula is longer than {MAX_TOKENS} tokens"),
            ));
        }
        let mut parser = Parser::new(tokens, source.chars().count());
        let expr = parser.parse_expression(0)?;
        parser.expect_end()?;
        Ok(Formula {
            source: source.trim().to_string(),
            expr,
        })
    }

    pub fn evaluate(&self, x: Decimal) -> Result<Decimal, EvalFailure> {
        eval(&self.expr, x)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Formula {
    type Err = EvalFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate in one step.
pub fn evaluate(formula: &str, x: Decimal) -> Result<Decimal, EvalFailure> {
    Formula::parse(formula)?.evaluate(x)
}

fn eval(expr: &Expr, x: Decimal) -> Result<Decimal, EvalFailure> {
    match expr {
        Expr::Number(v) => Ok(*v),
        Expr::Var => Ok(x),
        Expr::Neg(inner) => Ok(-eval(inner, x)?),
        Expr::Binary(op, lhs, rhs) => {
            let a = eval(lhs, x)?;
            let b = eval(rhs, x)?;
            match op {
                BinOp::Add => a.checked_add(b).ok_or(EvalFailure::Overflow),
                BinOp::Sub => a.checked_sub(b).ok_or(EvalFailure::Overflow),
                BinOp::Mul => a.checked_mul(b).ok_or(EvalFailure::Overflow),
                BinOp::Div => {
                    if b.is_zero() {
                        return Err(EvalFailure::DivisionByZero);
                    }
                    a.checked_div(b).ok_or(EvalFailure::Overflow)
                }
                BinOp::Pow => power(a, b),
            }
        }
    }
}

fn power(base: Decimal, exponent: Decimal) -> Result<Decimal, EvalFailure> {
    if exponent.fract().is_zero() {
        let n = exponent.to_i64().ok_or(EvalFailure::InvalidPower)?;
        if base.is_zero() && n < 0 {
            return Err(EvalFailure::DivisionByZero);
        }
        return base.checked_powi(n).ok_or(EvalFailure::InvalidPower);
    }
    if base.is_sign_negative() && !base.is_zero() {
        return Err(EvalFailure::InvalidPower);
    }
    base.checked_powd(exponent).ok_or(EvalFailure::InvalidPower)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Number(Decimal),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, EvalFailure> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.index += 1;
                continue;
            }
            let position = self.index;
            let kind = match ch {
                '+' => self.single(TokenKind::Plus),
                '-' | '−' => self.single(TokenKind::Minus),
                '*' if self.peek_at(1) == Some('*') => {
                    self.index += 2;
                    TokenKind::Pow
                }
                '*' | '×' => self.single(TokenKind::Star),
                '/' | '÷' => self.single(TokenKind::Slash),
                '^' => self.single(TokenKind::Pow),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                c if c.is_ascii_digit() => self.read_number()?,
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
                c if c.is_alphabetic() || c == '_' => self.read_ident(),
                other => {
                    return Err(EvalFailure::parse(
                        position,
                        format!("unexpected character '{other}'"),
                    ))
                }
            };
            tokens.push(Token { kind, position });
        }
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.index += 1;
        kind
    }

    fn read_number(&mut self) -> Result<TokenKind, EvalFailure> {
        let start = self.index;
        self.skip_digits();

        if matches!(self.peek(), Some('.') | Some(','))
            && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.index += 1;
            self.skip_digits();
        }

        let mut scientific = false;
        if matches!(self.peek(), Some('e') | Some('E')) {
            let digit_at = match self.peek_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                scientific = true;
                self.index += digit_at;
                self.skip_digits();
            }
        }

        let literal: String = self.chars[start..self.index].iter().collect();
        let normalized = literal.replace(',', ".");
        let value = if scientific {
            Decimal::from_scientific(&normalized)
        } else {
            Decimal::from_str(&normalized)
        };
        value
            .map(TokenKind::Number)
            .map_err(|e| EvalFailure::parse(start, format!("invalid number '{literal}': {e}")))
    }

    fn read_ident(&mut self) -> TokenKind {
        let start = self.index;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.index += 1;
            } else {
                break;
            }
        }
        TokenKind::Ident(self.chars[start..self.index].iter().collect())
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.index += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    input_len: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, input_len: usize) -> Self {
        Self {
            tokens,
            position: 0,
            input_len,
        }
    }

    fn parse_expression(&mut self, depth: usize) -> Result<Expr, EvalFailure> {
        self.check_depth(depth)?;
        let mut expr = self.parse_term(depth)?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.position += 1;
            let rhs = self.parse_term(depth)?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_term(&mut self, depth: usize) -> Result<Expr, EvalFailure> {
        let mut expr = self.parse_unary(depth)?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => break,
            };
            self.position += 1;
            let rhs = self.parse_unary(depth)?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_unary(&mut self, depth: usize) -> Result<Expr, EvalFailure> {
        self.check_depth(depth)?;
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                self.position += 1;
                let inner = self.parse_unary(depth + 1)?;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(TokenKind::Plus) => {
                self.position += 1;
                self.parse_unary(depth + 1)
            }
            _ => self.parse_power(depth),
        }
    }

    fn parse_power(&mut self, depth: usize) -> Result<Expr, EvalFailure> {
        let base = self.parse_primary(depth)?;
        if self.peek_kind() == Some(&TokenKind::Pow) {
            self.position += 1;
            let exponent = self.parse_unary(depth + 1)?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self, depth: usize) -> Result<Expr, EvalFailure> {
        let Some(token) = self.tokens.get(self.position).cloned() else {
            return Err(EvalFailure::parse(self.input_len, "unexpected end of formula"));
        };
        self.position += 1;
        match token.kind {
            TokenKind::Number(v) => Ok(Expr::Number(v)),
            TokenKind::Ident(name) if name == VARIABLE => Ok(Expr::Var),
            TokenKind::Ident(name) => Err(EvalFailure::UnknownName(name)),
            TokenKind::LParen => {
                let expr = self.parse_expression(depth + 1)?;
                match self.tokens.get(self.position) {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => {
                        self.position += 1;
                        Ok(expr)
                    }
                    Some(other) => Err(EvalFailure::parse(other.position, "expected ')'")),
                    None => Err(EvalFailure::parse(self.input_len, "missing ')'")),
                }
            }
            other => Err(EvalFailure::parse(
                token.position,
                format!("unexpected {}", describe(&other)),
            )),
        }
    }

    fn expect_end(&self) -> Result<(), EvalFailure> {
        match self.tokens.get(self.position) {
            None => Ok(()),
            Some(token) => match &token.kind {
                TokenKind::Ident(name) if name != VARIABLE => {
                    Err(EvalFailure::UnknownName(name.clone()))
                }
                kind => Err(EvalFailure::parse(
                    token.position,
                    format!("unexpected {}", describe(kind)),
                )),
            },
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), EvalFailure> {
        if depth > MAX_DEPTH {
            let position = self
                .tokens
                .get(self.position)
                .map_or(self.input_len, |t| t.position);
            return Err(EvalFailure::parse(position, "formula is nested too deeply"));
        }
        Ok(())
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.position).map(|t| &t.kind)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(v) => format!("number {v}"),
        TokenKind::Ident(name) => format!("name '{name}'"),
        TokenKind::Plus => "'+'".into(),
        TokenKind::Minus => "'-'".into(),
        TokenKind::Star => "'*'".into(),
        TokenKind::Slash => "'/'".into(),
        TokenKind::Pow => "'**'".into(),
        TokenKind::LParen => "'('".into(),
        TokenKind::RParen => "')'".into(),
    }
}
