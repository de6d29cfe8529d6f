//! Grammar data model
//!
//!     A grammar is data, not code: a start rule, an ordered list of rules,
//!     an ordered list of terminals, and an ordered list of backend directives.
//!     Every way of authoring a grammar (builder calls, a structured document,
//!     raw grammar text) funnels into the one [GrammarSpec] value, and backends
//!     consume only that value or raw text.
//!
//! Pattern Convention
//!
//!     A terminal pattern wrapped in slashes (`/-?\d+/`) is a regular
//!     expression; any other pattern is a literal string. The convention is
//!     shared with the rendered grammar text, so specs and text round-trip.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named production rule. The definition is a grammar expression over rule
/// names, TERMINAL names, and quoted literals (`call (DOT call)*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub definition: String,
    #[serde(default)]
    pub description: String,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        definition: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            description: description.into(),
        }
    }
}

/// A named terminal. See the module docs for the literal/regex convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub description: String,
}

impl Terminal {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            description: description.into(),
        }
    }

    /// True when the pattern is a regular expression (slash-wrapped).
    pub fn is_regex(&self) -> bool {
        self.pattern.len() >= 2 && self.pattern.starts_with('/') && self.pattern.ends_with('/')
    }

    /// The regex body without the wrapping slashes, or the literal unchanged.
    pub fn pattern_body(&self) -> &str {
        if self.is_regex() {
            &self.pattern[1..self.pattern.len() - 1]
        } else {
            &self.pattern
        }
    }
}

/// An opaque backend instruction (`%import common.WS`, `%ignore WS`).
///
/// The core never interprets directives; they are passed through to the
/// backend in declaration order and stripped from the external CFG export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directive(pub String);

impl Directive {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The complete grammar: immutable once constructed.
///
/// Construct via [GrammarBuilder](crate::chant::grammar::GrammarBuilder) or
/// the config loader; there are no public mutators. Safe to share read-only
/// across any number of backend compilations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarSpec {
    start: String,
    rules: Vec<Rule>,
    terminals: Vec<Terminal>,
    directives: Vec<Directive>,
}

impl GrammarSpec {
    /// Validate and freeze the parts into a spec.
    ///
    /// Fails when a rule or terminal name is duplicated, when a terminal name
    /// collides with a rule name, or when the start rule is absent.
    pub fn new(
        start: impl Into<String>,
        rules: Vec<Rule>,
        terminals: Vec<Terminal>,
        directives: Vec<Directive>,
    ) -> Result<Self, DefinitionError> {
        let start = start.into();
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|r| r.name == rule.name) {
                return Err(DefinitionError::DuplicateRule(rule.name.clone()));
            }
        }
        for (i, term) in terminals.iter().enumerate() {
            if terminals[..i].iter().any(|t| t.name == term.name) {
                return Err(DefinitionError::DuplicateTerminal(term.name.clone()));
            }
            if rules.iter().any(|r| r.name == term.name) {
                return Err(DefinitionError::TerminalClashesRule(term.name.clone()));
            }
        }
        if !rules.iter().any(|r| r.name == start) {
            return Err(DefinitionError::MissingStartRule(start));
        }
        Ok(Self {
            start,
            rules,
            terminals,
            directives,
        })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn terminal(&self, name: &str) -> Option<&Terminal> {
        self.terminals.iter().find(|t| t.name == name)
    }
}

/// Errors raised while defining a grammar or registering verbs, before any
/// parsing occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    DuplicateRule(String),
    DuplicateTerminal(String),
    TerminalClashesRule(String),
    MissingStartRule(String),
    DuplicateVerb(String),
    DuplicateParameter { verb: String, param: String },
    RequiredAfterDefaulted { verb: String, param: String },
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionError::DuplicateRule(name) => write!(f, "duplicate rule: {}", name),
            DefinitionError::DuplicateTerminal(name) => write!(f, "duplicate terminal: {}", name),
            DefinitionError::TerminalClashesRule(name) => {
                write!(f, "terminal name collides with rule: {}", name)
            }
            DefinitionError::MissingStartRule(start) => {
                write!(f, "start rule not defined: {}", start)
            }
            DefinitionError::DuplicateVerb(name) => write!(f, "duplicate verb: {}", name),
            DefinitionError::DuplicateParameter { verb, param } => {
                write!(f, "verb {} declares parameter {} twice", verb, param)
            }
            DefinitionError::RequiredAfterDefaulted { verb, param } => {
                write!(
                    f,
                    "verb {} declares required parameter {} after a defaulted one",
                    verb, param
                )
            }
        }
    }
}

impl std::error::Error for DefinitionError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> Rule {
        Rule::new(name, "VALUE", "")
    }

    #[test]
    fn test_accepts_distinct_names() {
        let spec = GrammarSpec::new(
            "start",
            vec![rule("start"), rule("value")],
            vec![Terminal::new("VALUE", "/\\d+/", "")],
            vec![],
        );
        assert!(spec.is_ok());
    }

    #[test]
    fn test_rejects_duplicate_rule() {
        let err = GrammarSpec::new("start", vec![rule("start"), rule("start")], vec![], vec![]);
        assert_eq!(err, Err(DefinitionError::DuplicateRule("start".into())));
    }

    #[test]
    fn test_rejects_duplicate_terminal() {
        let err = GrammarSpec::new(
            "start",
            vec![rule("start")],
            vec![Terminal::new("A", "a", ""), Terminal::new("A", "b", "")],
            vec![],
        );
        assert_eq!(err, Err(DefinitionError::DuplicateTerminal("A".into())));
    }

    #[test]
    fn test_rejects_terminal_clashing_rule() {
        let err = GrammarSpec::new(
            "start",
            vec![rule("start")],
            vec![Terminal::new("start", "s", "")],
            vec![],
        );
        assert_eq!(
            err,
            Err(DefinitionError::TerminalClashesRule("start".into()))
        );
    }

    #[test]
    fn test_rejects_missing_start() {
        let err = GrammarSpec::new("start", vec![rule("value")], vec![], vec![]);
        assert_eq!(err, Err(DefinitionError::MissingStartRule("start".into())));
    }

    #[test]
    fn test_pattern_convention() {
        let regex = Terminal::new("NUMBER", "/-?\\d+/", "");
        assert!(regex.is_regex());
        assert_eq!(regex.pattern_body(), "-?\\d+");

        let literal = Terminal::new("DOT", ".", "");
        assert!(!literal.is_regex());
        assert_eq!(literal.pattern_body(), ".");

        // A single slash is a literal, not an empty regex.
        let slash = Terminal::new("SLASH", "/", "");
        assert!(!slash.is_regex());
    }
}
