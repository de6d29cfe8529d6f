//! Parsing backends
//!
//!     A backend turns a grammar into a working parser. It accepts either a
//!     [GrammarSpec](crate::chant::grammar::GrammarSpec) or raw grammar text
//!     (the escape hatch for hand-authored grammars), and can also reduce a
//!     grammar to a standalone CFG for external constrained generators.
//!
//!     The built-in backend is [DescentBackend]: a backtracking recursive
//!     descent interpreter over the grammar data. Compilation is the
//!     expensive, fallible step; the compiled parser is immutable and may be
//!     reused (and shared read-only) across any number of `parse` calls.

pub mod descent;
pub mod expr;
pub mod meta;
pub mod render;

use std::fmt;
use std::ops::Range;

use crate::chant::ast::Program;
use crate::chant::grammar::{DefinitionError, GrammarSpec};

pub use descent::DescentBackend;

/// What a backend compiles: a spec, or raw grammar text.
#[derive(Debug, Clone, Copy)]
pub enum GrammarInput<'a> {
    Spec(&'a GrammarSpec),
    Text(&'a str),
}

/// Compiles grammars into parsers.
pub trait Backend {
    /// Compile a grammar into a reusable parser.
    fn compile(&self, input: GrammarInput<'_>) -> Result<Box<dyn Parser>, GrammarError>;

    /// Render a spec as this backend's grammar text.
    fn render(&self, spec: &GrammarSpec) -> String;

    /// Strip backend-only directive lines, leaving a standalone CFG.
    /// Syntax-preserving for every rule and terminal line.
    fn clean_for_external_grammar(&self, grammar_text: &str) -> String;
}

/// A compiled, reusable parser. Parsing is pure: no state beyond the
/// compiled grammar, so one parser may serve many `parse` calls.
pub trait Parser: Send + Sync {
    /// Parse DSL source text into a program.
    fn parse(&self, source: &str) -> Result<Program, SyntaxError>;

    /// The grammar text this parser was compiled from (rendered when the
    /// input was a spec).
    fn grammar_text(&self) -> &str;
}

/// The grammar itself is invalid: raised at compile time, naming the
/// offending rule or terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// Grammar text did not tokenize or parse as grammar notation.
    MetaSyntax { offset: usize, message: String },
    /// A rule definition string did not parse as a grammar expression.
    BadDefinition { rule: String, message: String },
    /// A definition references a rule or terminal that is not declared.
    UnknownReference { rule: String, name: String },
    /// A terminal's regex pattern failed to compile.
    BadTerminalPattern { terminal: String, message: String },
    /// The rule is (directly or mutually) left-recursive, which a descent
    /// engine cannot run.
    LeftRecursive { rule: String },
    /// AST lowering requires this rule name to be present.
    MissingCanonicalRule { rule: String },
    /// `%ignore` names a terminal that does not exist.
    UnknownIgnore { name: String },
    /// `%import common.<NAME>` names a class this backend does not provide.
    UnknownImport { name: String },
    Definition(DefinitionError),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::MetaSyntax { offset, message } => {
                write!(f, "invalid grammar text at byte {}: {}", offset, message)
            }
            GrammarError::BadDefinition { rule, message } => {
                write!(f, "invalid definition for rule {}: {}", rule, message)
            }
            GrammarError::UnknownReference { rule, name } => {
                write!(f, "rule {} references undefined name {}", rule, name)
            }
            GrammarError::BadTerminalPattern { terminal, message } => {
                write!(f, "invalid pattern for terminal {}: {}", terminal, message)
            }
            GrammarError::LeftRecursive { rule } => {
                write!(f, "rule {} is left-recursive", rule)
            }
            GrammarError::MissingCanonicalRule { rule } => {
                write!(f, "grammar does not define the {} rule", rule)
            }
            GrammarError::UnknownIgnore { name } => {
                write!(f, "%ignore references unknown terminal {}", name)
            }
            GrammarError::UnknownImport { name } => {
                write!(f, "unsupported import: common.{}", name)
            }
            GrammarError::Definition(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for GrammarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GrammarError::Definition(err) => Some(err),
            _ => None,
        }
    }
}

/// DSL source text does not match the compiled grammar.
///
/// Line and column are 1-based; `expected` lists the terminal names the
/// parser could have accepted at the failure point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub expected: Vec<String>,
    pub found: Option<String>,
}

impl SyntaxError {
    pub fn new(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = position(source, offset);
        Self {
            line,
            column,
            message: message.into(),
            expected: Vec::new(),
            found: None,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error at line {}, column {}: {}",
            self.line, self.column, self.message
        )?;
        if let Some(found) = &self.found {
            write!(f, " (found {})", found)?;
        }
        if !self.expected.is_empty() {
            write!(f, ", expected {}", self.expected.join(" | "))?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

/// 1-based (line, column) of a byte offset in source text.
pub fn position(source: &str, offset: usize) -> (usize, usize) {
    let clamped = offset.min(source.len());
    let before = &source[..clamped];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|nl| clamped - nl)
        .unwrap_or(clamped + 1);
    (line, column)
}

/// Byte range into source text.
pub type Span = Range<usize>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position() {
        let source = "ab\ncd\nef";
        assert_eq!(position(source, 0), (1, 1));
        assert_eq!(position(source, 1), (1, 2));
        assert_eq!(position(source, 3), (2, 1));
        assert_eq!(position(source, 7), (3, 2));
        // Offsets past the end clamp to the last position.
        assert_eq!(position(source, 100), (3, 3));
    }

    #[test]
    fn test_syntax_error_display() {
        let mut err = SyntaxError::new("list_tasks(", 11, "unexpected end of input");
        err.expected = vec!["IDENTIFIER".into(), "\")\"".into()];
        let text = err.to_string();
        assert!(text.contains("line 1, column 12"));
        assert!(text.contains("IDENTIFIER | \")\""));
    }
}
