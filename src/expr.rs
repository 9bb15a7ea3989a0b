//! A small boolean expression language for record filters.
//!
//! Expressions combine comparisons on record fields:
//!
//! ```text
//! length >= 100 && name =~ "^chr[0-9]+$"
//! !(filter == "PASS") || info.DP > 20
//! ```
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or         := and ("||" and)*
//! and        := unary ("&&" unary)*
//! unary      := "!" unary | primary
//! primary    := "(" or ")" | comparison
//! comparison := operand [("==" | "!=" | "<" | "<=" | ">" | ">=") operand]
//!             | operand ("=~" | "!~") string
//! operand    := identifier | number | string | "true" | "false"
//! ```
//!
//! Identifiers name record fields and may contain dots (`info.DP`).
//! A comparison involving a missing value (`.` in most formats) is false.
//! Unknown fields and incomparable types are evaluation errors.

use crate::error::{Error, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A field value exposed to expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Text value, or `Missing` for the conventional `.` placeholder.
    pub fn text(s: &str) -> Self {
        if s == "." || s == "*" {
            Value::Missing
        } else {
            Value::Text(s.to_string())
        }
    }

    /// Numeric value parsed from text; unparseable text stays text.
    pub fn number(s: &str) -> Self {
        match s.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::text(s),
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Missing => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "."),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Records that expose named fields to expressions.
pub trait Fields {
    /// Look up `name`; `None` means the record type has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn test(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone)]
enum Operand {
    Field(String),
    Literal(Value),
}

#[derive(Debug, Clone)]
enum Node {
    Or(Box<Node>, Box<Node>),
    And(Box<Node>, Box<Node>),
    Not(Box<Node>),
    Compare(Operand, Op, Operand),
    Match(Operand, Regex, bool),
    Truthy(Operand),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    LParen,
    RParen,
    Or,
    And,
    Not,
    Op(Op),
    Matches,
    NotMatches,
}

/// A parsed filter expression.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    /// Parse an expression.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(Error::Expression(format!(
                "unexpected {:?} in '{}'",
                token, source
            )));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a record.
    pub fn evaluate<T: Fields + ?Sized>(&self, record: &T) -> Result<bool> {
        eval(&self.root, record)
    }
}

impl FromStr for Expression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Expression::parse(s)
    }
}

fn resolve<T: Fields + ?Sized>(operand: &Operand, record: &T) -> Result<Value> {
    match operand {
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Field(name) => record
            .field(name)
            .ok_or_else(|| Error::Expression(format!("unknown field '{}'", name))),
    }
}

fn eval<T: Fields + ?Sized>(node: &Node, record: &T) -> Result<bool> {
    match node {
        Node::Or(a, b) => Ok(eval(a, record)? || eval(b, record)?),
        Node::And(a, b) => Ok(eval(a, record)? && eval(b, record)?),
        Node::Not(a) => Ok(!eval(a, record)?),
        Node::Truthy(operand) => Ok(resolve(operand, record)?.truthy()),
        Node::Match(operand, regex, negate) => match resolve(operand, record)? {
            Value::Missing => Ok(false),
            value => Ok(regex.is_match(&value.to_string()) != *negate),
        },
        Node::Compare(left, op, right) => {
            let left = resolve(left, record)?;
            let right = resolve(right, record)?;
            compare(&left, *op, &right)
        }
    }
}

fn compare(left: &Value, op: Op, right: &Value) -> Result<bool> {
    let ordering = match (left, right) {
        (Value::Missing, _) | (_, Value::Missing) => return Ok(false),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) if matches!(op, Op::Eq | Op::Ne) => a.cmp(b),
        (Value::Bool(_), _) | (_, Value::Bool(_)) => {
            return Err(Error::Expression(format!(
                "cannot compare {} with {}",
                left, right
            )))
        }
        _ => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| {
                Error::Expression(format!("cannot compare {} with {}", left, right))
            })?,
            _ => {
                return Err(Error::Expression(format!(
                    "cannot compare {} with {} numerically",
                    left, right
                )))
            }
        },
    };
    Ok(op.test(ordering))
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Op(Op::Eq));
                i += 2;
            }
            '=' if next == Some('~') => {
                tokens.push(Token::Matches);
                i += 2;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Op(Op::Ne));
                i += 2;
            }
            '!' if next == Some('~') => {
                tokens.push(Token::NotMatches);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '<' | '>' => {
                let inclusive = next == Some('=');
                tokens.push(Token::Op(match (c, inclusive) {
                    ('<', true) => Op::Le,
                    ('<', false) => Op::Lt,
                    (_, true) => Op::Ge,
                    (_, false) => Op::Gt,
                }));
                i += if inclusive { 2 } else { 1 };
            }
            '"' | '\'' => {
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(Error::Expression(format!(
                                "unterminated string in '{}'",
                                source
                            )))
                        }
                        Some(&q) if q == c => {
                            i += 1;
                            break;
                        }
                        Some('\\') if i + 1 < chars.len() => {
                            text.push(chars[i + 1]);
                            i += 2;
                        }
                        Some(&ch) => {
                            text.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_ascii_digit()
                || (c == '-' && next.is_some_and(|n| n.is_ascii_digit() || n == '.')
                    && !matches!(
                        tokens.last(),
                        Some(Token::Ident(_)) | Some(Token::Number(_)) | Some(Token::Str(_))
                    ))
                || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() {
                    let ch = chars[i];
                    let exponent_sign =
                        (ch == '-' || ch == '+') && matches!(chars[i - 1], 'e' | 'E');
                    if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' || exponent_sign
                    {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse().map_err(|_| {
                    Error::Expression(format!("invalid number '{}' in '{}'", text, source))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(Error::Expression(format!(
                    "unexpected character '{}' in '{}'",
                    other, source
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Node> {
        let mut node = self.parse_and()?;
        while self.eat(&Token::Or) {
            node = Node::Or(Box::new(node), Box::new(self.parse_and()?));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node> {
        let mut node = self.parse_unary()?;
        while self.eat(&Token::And) {
            node = Node::And(Box::new(node), Box::new(self.parse_unary()?));
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node> {
        if self.eat(&Token::Not) {
            return Ok(Node::Not(Box::new(self.parse_unary()?)));
        }
        if self.eat(&Token::LParen) {
            let node = self.parse_or()?;
            if !self.eat(&Token::RParen) {
                return Err(Error::Expression("missing ')'".to_string()));
            }
            return Ok(node);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node> {
        let left = self.parse_operand()?;
        match self.peek() {
            Some(Token::Op(op)) => {
                let op = *op;
                self.pos += 1;
                let right = self.parse_operand()?;
                Ok(Node::Compare(left, op, right))
            }
            Some(Token::Matches) | Some(Token::NotMatches) => {
                let negate = self.next() == Some(Token::NotMatches);
                match self.next() {
                    Some(Token::Str(pattern)) => Ok(Node::Match(left, Regex::new(&pattern)?, negate)),
                    other => Err(Error::Expression(format!(
                        "expected a quoted pattern after =~, found {:?}",
                        other
                    ))),
                }
            }
            _ => Ok(Node::Truthy(left)),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "true" => Operand::Literal(Value::Bool(true)),
                "false" => Operand::Literal(Value::Bool(false)),
                _ => Operand::Field(name),
            }),
            Some(Token::Number(n)) => Ok(Operand::Literal(Value::Number(n))),
            Some(Token::Str(s)) => Ok(Operand::Literal(Value::Text(s))),
            Some(other) => Err(Error::Expression(format!(
                "expected a field or literal, found {:?}",
                other
            ))),
            None => Err(Error::Expression("unexpected end of expression".to_string())),
        }
    }
}
