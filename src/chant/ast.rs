//! Abstract syntax tree
//!
//!     The parsed shape of a DSL program: an ordered sequence of statements,
//!     each an ordered chain of calls, each call carrying ordered arguments
//!     with literal values. Spans are byte ranges into the original source,
//!     kept for diagnostics.
//!
//! Values are converted at parse time: numbers to f64, strings to unescaped
//! text, identifiers to raw reference tokens.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// A literal value appearing as an argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Number(f64),
    Str(String),
    /// A bare identifier used as a reference token, kept verbatim.
    Ident(String),
}

impl Value {
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn ident(s: impl Into<String>) -> Self {
        Value::Ident(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text content for strings and identifiers.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Ident(s) => Some(s),
            Value::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Ident(s) => write!(f, "{}", s),
        }
    }
}

/// One argument: `keyword=value` or a bare positional value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arg {
    pub keyword: Option<String>,
    pub value: Value,
}

impl Arg {
    pub fn positional(value: Value) -> Self {
        Self {
            keyword: None,
            value,
        }
    }

    pub fn keyword(name: impl Into<String>, value: Value) -> Self {
        Self {
            keyword: Some(name.into()),
            value,
        }
    }
}

/// One call within a chain: `name(args...)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    pub name: String,
    pub args: Vec<Arg>,
    /// Byte range of the call name in the source text.
    #[serde(skip)]
    pub span: Range<usize>,
}

impl Call {
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
            span: 0..0,
        }
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }
}

/// One statement: a dot-chained sequence of calls, executed left to right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallChain {
    pub calls: Vec<Call>,
}

impl CallChain {
    pub fn new(calls: Vec<Call>) -> Self {
        Self { calls }
    }
}

/// A parsed program: statements in source order, top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<CallChain>,
}

impl Program {
    pub fn new(statements: Vec<CallChain>) -> Self {
        Self { statements }
    }

    /// Total number of calls across all statements.
    pub fn call_count(&self) -> usize {
        self.statements.iter().map(|c| c.calls.len()).sum()
    }
}

/// Decode backslash escapes in a string literal body (quotes not included).
///
/// Recognizes \n, \t, \r, \", \\, \'; any other escaped character is kept
/// verbatim, matching how the canonical STRING terminal tokenizes.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::number(4.5).as_number(), Some(4.5));
        assert_eq!(Value::string("hi").as_str(), Some("hi"));
        assert_eq!(Value::ident("x").as_str(), Some("x"));
        assert_eq!(Value::number(1.0).as_str(), None);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\nb"), "a\nb");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r"back\\slash"), "back\\slash");
        assert_eq!(unescape(r"plain"), "plain");
        assert_eq!(unescape(r"odd\q"), "oddq");
    }

    #[test]
    fn test_call_count() {
        let program = Program::new(vec![
            CallChain::new(vec![Call::new("a", vec![]), Call::new("b", vec![])]),
            CallChain::new(vec![Call::new("c", vec![])]),
        ]);
        assert_eq!(program.call_count(), 3);
    }
}
