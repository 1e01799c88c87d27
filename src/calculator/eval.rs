//! Arithmetic expression evaluator
//!
//! Tokenizer, recursive descent parser and tree-walking evaluator for the
//! strings the keypad can build. Numbers follow Python's int/float rules:
//! integers are unbounded and stay integers under `+ - * // **`, `/` always produces a float,
//! and results print the way Python's `str()` prints them.

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
use thiserror::Error;

/// Largest integer power result, in bits, computed exactly
const MAX_POWER_BITS: u64 = 1 << 20;

/// Why an expression could not be evaluated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Nothing to evaluate
    #[error("empty expression")]
    EmptyInput,
    /// Malformed input
    #[error("syntax error: {0}")]
    Syntax(String),
    /// `/` or `//` by zero, or zero raised to a negative power
    #[error("division by zero")]
    DivisionByZero,
    /// Out-of-range or complex results
    #[error("arithmetic error: {0}")]
    Runtime(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Numeric value produced by evaluation. Integers are unbounded.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(BigInt),
    Float(f64),
}

impl Value {
    /// Float view, failing when an integer is beyond the f64 range
    pub fn as_f64(&self) -> EvalResult<f64> {
        match self {
            Value::Int(i) => i
                .to_f64()
                .filter(|f| f.is_finite())
                .ok_or_else(|| EvalError::Runtime("integer too large to convert to float".to_string())),
            Value::Float(f) => Ok(*f),
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Value::Int(i) => i.is_zero(),
            Value::Float(f) => *f == 0.0,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

/// Shortest round-trip float text, exponent form outside [1e-4, 1e16)
fn format_float(v: f64) -> String {
    let abs = v.abs();
    if abs == 0.0 || (1e-4..1e16).contains(&abs) {
        let s = format!("{}", v);
        return if s.contains('.') { s } else { format!("{}.0", s) };
    }

    let s = format!("{:e}", v);
    match s.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => s,
        },
        None => s,
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Power,
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// Lexical tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(Value),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    LeftParen,
    RightParen,
}

/// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Number(Value),
    Unary {
        op: UnaryOp,
        operand: Box<Ast>,
    },
    Binary {
        left: Box<Ast>,
        op: BinaryOp,
        right: Box<Ast>,
    },
}

impl Ast {
    fn unary(op: UnaryOp, operand: Ast) -> Self {
        Ast::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    fn binary(left: Ast, op: BinaryOp, right: Ast) -> Self {
        Ast::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

/// Split an expression string into tokens
pub fn tokenize(input: &str) -> EvalResult<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                let (token, end) = read_number(input, pos)?;
                pos = end;
                tokens.push(token);
                continue;
            }
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 1;
                Token::DoubleStar
            }
            b'*' => Token::Star,
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos += 1;
                Token::DoubleSlash
            }
            b'/' => Token::Slash,
            b'(' => Token::LeftParen,
            b')' => Token::RightParen,
            _ => {
                let ch = input[pos..].chars().next().unwrap_or('?');
                return Err(EvalError::Syntax(format!("unexpected character '{}'", ch)));
            }
        };
        tokens.push(token);
        pos += 1;
    }

    Ok(tokens)
}

/// Read a numeric literal starting at `start`, returning it and the end offset
fn read_number(input: &str, start: usize) -> EvalResult<(Token, usize)> {
    let bytes = input.as_bytes();
    let mut end = start;
    let mut has_dot = false;

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !has_dot => {
                has_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    let text = &input[start..end];
    if text == "." {
        return Err(EvalError::Syntax("lone decimal point".to_string()));
    }

    if has_dot {
        let value: f64 = text
            .parse()
            .map_err(|_| EvalError::Syntax(format!("invalid number '{}'", text)))?;
        return Ok((Token::Number(Value::Float(value)), end));
    }

    if text.len() > 1 && text.starts_with('0') && text.bytes().any(|b| b != b'0') {
        return Err(EvalError::Syntax(format!(
            "leading zeros in integer literal '{}'",
            text
        )));
    }

    let value: BigInt = text
        .parse()
        .map_err(|_| EvalError::Syntax(format!("invalid number '{}'", text)))?;
    Ok((Token::Number(Value::Int(value)), end))
}

/// Recursive descent parser
///
/// ```text
/// expr    ::= term (('+' | '-') term)*
/// term    ::= factor (('*' | '/' | '//') factor)*
/// factor  ::= ('+' | '-') factor | power
/// power   ::= primary ('**' factor)?
/// primary ::= NUMBER | '(' expr ')'
/// ```
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse a whole string into a tree
    pub fn parse_str(input: &str) -> EvalResult<Ast> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(EvalError::EmptyInput);
        }

        let mut parser = Self::new(tokens);
        let ast = parser.parse_expr()?;

        if let Some(token) = parser.current() {
            return Err(EvalError::Syntax(format!(
                "unexpected {:?} at token {}",
                token, parser.pos
            )));
        }

        Ok(ast)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expr(&mut self) -> EvalResult<Ast> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = Ast::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> EvalResult<Ast> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.current() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                Some(Token::DoubleSlash) => BinaryOp::FloorDivide,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_factor()?;
            left = Ast::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> EvalResult<Ast> {
        let op = match self.current() {
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Minus) => UnaryOp::Minus,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        let operand = self.parse_factor()?;
        Ok(Ast::unary(op, operand))
    }

    fn parse_power(&mut self) -> EvalResult<Ast> {
        let base = self.parse_primary()?;
        if matches!(self.current(), Some(Token::DoubleStar)) {
            self.pos += 1;
            // Right associative, and the exponent may carry its own sign
            let exponent = self.parse_factor()?;
            return Ok(Ast::binary(base, BinaryOp::Power, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> EvalResult<Ast> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Ast::Number(value)),
            Some(Token::LeftParen) => {
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RightParen) => Ok(inner),
                    Some(token) => Err(EvalError::Syntax(format!("expected ')' but found {:?}", token))),
                    None => Err(EvalError::Syntax("unclosed parenthesis".to_string())),
                }
            }
            Some(token) => Err(EvalError::Syntax(format!("unexpected {:?}", token))),
            None => Err(EvalError::Syntax("unexpected end of expression".to_string())),
        }
    }
}

/// Evaluate a parsed tree
pub fn evaluate_ast(ast: &Ast) -> EvalResult<Value> {
    match ast {
        Ast::Number(value) => Ok(value.clone()),
        Ast::Unary { op, operand } => {
            let value = evaluate_ast(operand)?;
            Ok(match (op, value) {
                (UnaryOp::Plus, v) => v,
                (UnaryOp::Minus, Value::Int(i)) => Value::Int(-i),
                (UnaryOp::Minus, Value::Float(f)) => Value::Float(-f),
            })
        }
        Ast::Binary { left, op, right } => {
            let left = evaluate_ast(left)?;
            let right = evaluate_ast(right)?;
            apply(left, *op, right)
        }
    }
}

/// Parse and evaluate a string
pub fn evaluate(input: &str) -> EvalResult<Value> {
    let ast = Parser::parse_str(input)?;
    evaluate_ast(&ast)
}

fn apply(left: Value, op: BinaryOp, right: Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Divide => {
            if right.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            finite(left.as_f64()? / right.as_f64()?)
        }
        BinaryOp::FloorDivide => {
            if right.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            match (left, right) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.div_floor(&b))),
                (left, right) => finite((left.as_f64()? / right.as_f64()?).floor()),
            }
        }
        BinaryOp::Power => power(left, right),
        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                _ => a * b,
            })),
            (left, right) => {
                let (a, b) = (left.as_f64()?, right.as_f64()?);
                finite(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Subtract => a - b,
                    _ => a * b,
                })
            }
        },
    }
}

fn power(base: Value, exponent: Value) -> EvalResult<Value> {
    if let (Value::Int(b), Value::Int(e)) = (&base, &exponent) {
        if !e.is_negative() {
            return int_power(b, e).map(Value::Int);
        }
    }

    let (b, e) = (base.as_f64()?, exponent.as_f64()?);
    if b == 0.0 && e < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    if b < 0.0 && e.fract() != 0.0 {
        return Err(EvalError::Runtime("complex result".to_string()));
    }
    finite(b.powf(e))
}

/// Exact integer power for a non-negative exponent
fn int_power(base: &BigInt, exponent: &BigInt) -> EvalResult<BigInt> {
    // 0, 1 and -1 stay small whatever the exponent
    if base.bits() <= 1 {
        if exponent.is_zero() || base.is_positive() {
            return Ok(if exponent.is_zero() { BigInt::from(1) } else { base.clone() });
        }
        if base.is_zero() {
            return Ok(BigInt::zero());
        }
        return Ok(if exponent.is_even() { BigInt::from(1) } else { base.clone() });
    }

    let too_large = || EvalError::Runtime("integer power too large".to_string());
    let e = exponent.to_u32().ok_or_else(too_large)?;
    if base.bits().saturating_mul(u64::from(e)) > MAX_POWER_BITS {
        return Err(too_large());
    }
    Ok(base.pow(e))
}

fn finite(value: f64) -> EvalResult<Value> {
    if value.is_finite() {
        Ok(Value::Float(value))
    } else {
        Err(EvalError::Runtime("result out of range".to_string()))
    }
}
