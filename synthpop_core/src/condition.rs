//! Boolean condition language for conditional distributions.
//!
//! Rules such as `severity == 'severe' and age >= 65` are parsed once into
//! an AST and evaluated against a typed [`SampleContext`]. Nothing is ever
//! executed dynamically: the grammar is fixed.
//!
//! ```text
//! expr     := or
//! or       := and (("or" | "||") and)*
//! and      := not (("and" | "&&") not)*
//! not      := ("not" | "!") not | primary
//! primary  := "(" expr ")" | operand (cmp operand | "in" list)?
//! cmp      := "==" | "!=" | "<" | "<=" | ">" | ">="
//! list     := "[" (operand ("," operand)*)? "]"
//! operand  := identifier | number | 'text' | "text" | true | false
//! ```
//!
//! Evaluation is permissive: a missing identifier or a comparison between
//! incompatible types evaluates to `false` instead of failing the run.

use crate::value::{SampleContext, SampleValue};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Error produced while tokenizing or parsing a condition string.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at offset {offset}")]
pub struct ConditionParseError {
    pub message: String,
    pub offset: usize,
}

impl ConditionParseError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Reason an expression could not be evaluated (treated as `false`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("identifier '{0}' is not in the context")]
    MissingIdentifier(String),

    #[error("cannot compare {left} with {right}")]
    TypeMismatch { left: String, right: String },
}

// =============================================================================
// AST
// =============================================================================

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// A leaf of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Ident(String),
    Literal(SampleValue),
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare(Operand, CompareOp, Operand),
    In(Operand, Vec<Operand>),
    Truthy(Operand),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Parses a condition string.
    pub fn parse(source: &str) -> Result<Self, ConditionParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        match parser.peek() {
            TokenKind::Eof => Ok(expr),
            other => Err(ConditionParseError::new(
                format!("unexpected token {:?}", other),
                parser.offset(),
            )),
        }
    }

    /// Evaluates the expression, reporting why evaluation failed.
    pub fn try_evaluate(&self, context: &SampleContext) -> Result<bool, EvalError> {
        match self {
            Expr::Compare(left, op, right) => {
                let l = resolve(left, context)?;
                let r = resolve(right, context)?;
                compare(&l, *op, &r)
            }
            Expr::In(needle, haystack) => {
                let n = resolve(needle, context)?;
                for candidate in haystack {
                    let c = resolve(candidate, context)?;
                    if compare(&n, CompareOp::Eq, &c).unwrap_or(false) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Expr::Truthy(operand) => Ok(resolve(operand, context)?.is_truthy()),
            // Short-circuit like the surface syntax suggests
            Expr::And(a, b) => Ok(a.try_evaluate(context)? && b.try_evaluate(context)?),
            Expr::Or(a, b) => Ok(a.try_evaluate(context)? || b.try_evaluate(context)?),
            Expr::Not(inner) => Ok(!inner.try_evaluate(context)?),
        }
    }
}

fn resolve(operand: &Operand, context: &SampleContext) -> Result<SampleValue, EvalError> {
    match operand {
        Operand::Literal(v) => Ok(v.clone()),
        Operand::Ident(name) => context
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::MissingIdentifier(name.clone())),
    }
}

fn compare(left: &SampleValue, op: CompareOp, right: &SampleValue) -> Result<bool, EvalError> {
    let ordering = match (left, right) {
        (l, r) if l.is_numeric() && r.is_numeric() => {
            let (a, b) = (l.as_f64().unwrap_or(f64::NAN), r.as_f64().unwrap_or(f64::NAN));
            a.partial_cmp(&b)
        }
        (SampleValue::Text(a), SampleValue::Text(b)) => Some(a.cmp(b)),
        (SampleValue::Bool(a), SampleValue::Bool(b)) => Some(a.cmp(b)),
        _ => {
            return Err(EvalError::TypeMismatch {
                left: left.to_string(),
                right: right.to_string(),
            })
        }
    };

    // NaN compares unequal to everything
    let Some(ordering) = ordering else {
        return Ok(op == CompareOp::Ne);
    };

    Ok(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    })
}

// =============================================================================
// CONDITION (parsed or malformed)
// =============================================================================

/// A rule condition as declared in a profile.
///
/// Malformed sources are kept rather than rejected: they never match.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Parsed { source: String, expr: Expr },
    Malformed { source: String, error: ConditionParseError },
}

impl Condition {
    /// Parses `source`, logging a warning when it is malformed.
    pub fn new(source: &str) -> Self {
        match Expr::parse(source) {
            Ok(expr) => Condition::Parsed {
                source: source.to_string(),
                expr,
            },
            Err(error) => {
                tracing::warn!(condition = source, %error, "malformed condition never matches");
                Condition::Malformed {
                    source: source.to_string(),
                    error,
                }
            }
        }
    }

    /// Returns the original condition text.
    pub fn source(&self) -> &str {
        match self {
            Condition::Parsed { source, .. } | Condition::Malformed { source, .. } => source,
        }
    }

    /// Returns true when the source failed to parse.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Condition::Malformed { .. })
    }

    /// Evaluates against `context`; errors of any kind mean "no match".
    pub fn evaluate(&self, context: &SampleContext) -> bool {
        match self {
            Condition::Malformed { .. } => false,
            Condition::Parsed { source, expr } => match expr.try_evaluate(context) {
                Ok(matched) => matched,
                Err(error) => {
                    tracing::debug!(condition = %source, %error, "condition evaluated as false");
                    false
                }
            },
        }
    }
}

// =============================================================================
// LEXER
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Number(SampleValue),
    Text(String),
    True,
    False,
    And,
    Or,
    Not,
    In,
    Cmp(CompareOp),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    len: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            len: input.len(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ConditionParseError> {
        let mut tokens = Vec::new();
        loop {
            while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
                self.chars.next();
            }
            let Some(&(offset, c)) = self.chars.peek() else {
                tokens.push(Token { kind: TokenKind::Eof, offset: self.len });
                return Ok(tokens);
            };

            let kind = match c {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                ',' => self.single(TokenKind::Comma),
                '\'' | '"' => self.read_text(c, offset)?,
                '=' | '!' | '<' | '>' => self.read_operator(c, offset)?,
                '&' | '|' => self.read_symbolic_logic(c, offset)?,
                c if c.is_ascii_digit() || c == '-' || c == '.' => self.read_number(offset)?,
                c if c.is_alphabetic() || c == '_' => self.read_word(),
                other => {
                    return Err(ConditionParseError::new(
                        format!("unexpected character '{}'", other),
                        offset,
                    ))
                }
            };
            tokens.push(Token { kind, offset });
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.chars.next();
        kind
    }

    fn next_is(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some((_, c)) if *c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn read_operator(&mut self, first: char, offset: usize) -> Result<TokenKind, ConditionParseError> {
        self.chars.next();
        let eq = self.next_is('=');
        Ok(match (first, eq) {
            ('=', true) => TokenKind::Cmp(CompareOp::Eq),
            ('!', true) => TokenKind::Cmp(CompareOp::Ne),
            ('<', true) => TokenKind::Cmp(CompareOp::Le),
            ('>', true) => TokenKind::Cmp(CompareOp::Ge),
            ('<', false) => TokenKind::Cmp(CompareOp::Lt),
            ('>', false) => TokenKind::Cmp(CompareOp::Gt),
            ('!', false) => TokenKind::Not,
            _ => return Err(ConditionParseError::new("assignment is not allowed, use '=='", offset)),
        })
    }

    fn read_symbolic_logic(&mut self, first: char, offset: usize) -> Result<TokenKind, ConditionParseError> {
        self.chars.next();
        if !self.next_is(first) {
            return Err(ConditionParseError::new(
                format!("expected '{0}{0}'", first),
                offset,
            ));
        }
        Ok(if first == '&' { TokenKind::And } else { TokenKind::Or })
    }

    fn read_text(&mut self, quote: char, offset: usize) -> Result<TokenKind, ConditionParseError> {
        self.chars.next();
        let mut text = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == quote {
                return Ok(TokenKind::Text(text));
            }
            text.push(c);
        }
        Err(ConditionParseError::new("unterminated string literal", offset))
    }

    fn read_number(&mut self, offset: usize) -> Result<TokenKind, ConditionParseError> {
        let mut raw = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' || c == '-' || c == 'e' || c == 'E' {
                raw.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if let Ok(v) = raw.parse::<i64>() {
            return Ok(TokenKind::Number(SampleValue::Int(v)));
        }
        raw.parse::<f64>()
            .map(|v| TokenKind::Number(SampleValue::Float(v)))
            .map_err(|_| ConditionParseError::new(format!("invalid number '{}'", raw), offset))
    }

    fn read_word(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match word.as_str() {
            "and" | "AND" => TokenKind::And,
            "or" | "OR" => TokenKind::Or,
            "not" | "NOT" => TokenKind::Not,
            "in" | "IN" => TokenKind::In,
            "true" | "True" => TokenKind::True,
            "false" | "False" => TokenKind::False,
            _ => TokenKind::Ident(word),
        }
    }
}

// =============================================================================
// PARSER
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        // The lexer always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].offset
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn expect(&mut self, expected: TokenKind, what: &str) -> Result<(), ConditionParseError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(ConditionParseError::new(format!("expected {}", what), self.offset()))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ConditionParseError> {
        let mut left = self.parse_and()?;
        while *self.peek() == TokenKind::Or {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionParseError> {
        let mut left = self.parse_not()?;
        while *self.peek() == TokenKind::And {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ConditionParseError> {
        if *self.peek() == TokenKind::Not {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ConditionParseError> {
        if *self.peek() == TokenKind::LParen {
            self.advance();
            let expr = self.parse_or()?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(expr);
        }

        let left = self.parse_operand()?;
        match self.peek().clone() {
            TokenKind::Cmp(op) => {
                self.advance();
                let right = self.parse_operand()?;
                Ok(Expr::Compare(left, op, right))
            }
            TokenKind::In => {
                self.advance();
                Ok(Expr::In(left, self.parse_list()?))
            }
            _ => Ok(Expr::Truthy(left)),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Operand>, ConditionParseError> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mut items = Vec::new();
        if *self.peek() == TokenKind::RBracket {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.parse_operand()?);
            match self.advance() {
                TokenKind::Comma => continue,
                TokenKind::RBracket => return Ok(items),
                _ => return Err(ConditionParseError::new("expected ',' or ']'", self.offset())),
            }
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, ConditionParseError> {
        let offset = self.offset();
        match self.advance() {
            TokenKind::Ident(name) => Ok(Operand::Ident(name)),
            TokenKind::Number(v) => Ok(Operand::Literal(v)),
            TokenKind::Text(s) => Ok(Operand::Literal(SampleValue::Text(s))),
            TokenKind::True => Ok(Operand::Literal(SampleValue::Bool(true))),
            TokenKind::False => Ok(Operand::Literal(SampleValue::Bool(false))),
            TokenKind::Eof => Err(ConditionParseError::new("unexpected end of condition", offset)),
            other => Err(ConditionParseError::new(
                format!("expected a value, found {:?}", other),
                offset,
            )),
        }
    }
}
