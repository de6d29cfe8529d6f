//! Structured grammar documents
//!
//!     Grammars can be declared as plain structured documents (a mapping with
//!     `start`, `rules`, `terminals`, `directives`) and loaded into the same
//!     [GrammarSpec] the builder produces, order preserved. The YAML loader is
//!     a pure preprocessing step: it deserializes the text into the mapping
//!     shape and delegates here, with no grammar-specific logic of its own.
//!
//! Document shape:
//!
//!     start: start
//!     rules:
//!       - name: start
//!         definition: call_chain
//!         description: Entry point
//!     terminals:
//!       - name: DOT
//!         pattern: "."
//!         description: Dot separator
//!     directives:
//!       - "%import common.WS"
//!       - "%ignore WS"

use serde::Deserialize;
use std::fmt;

use super::spec::{DefinitionError, Directive, GrammarSpec, Rule, Terminal};

/// The mapping form of a grammar document.
///
/// `description` fields may be omitted; everything else is required shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarConfig {
    pub start: String,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
    #[serde(default)]
    pub terminals: Vec<TerminalEntry>,
    #[serde(default)]
    pub directives: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleEntry {
    pub name: String,
    pub definition: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerminalEntry {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub description: String,
}

impl GrammarConfig {
    /// Convert into a [GrammarSpec], preserving declaration order.
    pub fn into_spec(self) -> Result<GrammarSpec, ConfigError> {
        if self.start.trim().is_empty() {
            return Err(ConfigError::MissingStart);
        }
        if !self.rules.iter().any(|r| r.name == self.start) {
            return Err(ConfigError::UndefinedStart(self.start));
        }
        let rules = self
            .rules
            .into_iter()
            .map(|r| Rule::new(r.name, r.definition, r.description))
            .collect();
        let terminals = self
            .terminals
            .into_iter()
            .map(|t| Terminal::new(t.name, t.pattern, t.description))
            .collect();
        let directives = self.directives.into_iter().map(Directive::new).collect();
        GrammarSpec::new(self.start, rules, terminals, directives).map_err(ConfigError::Definition)
    }
}

/// Load a grammar from YAML document text.
pub fn load_grammar_from_yaml(text: &str) -> Result<GrammarSpec, ConfigError> {
    let config: GrammarConfig =
        serde_yaml::from_str(text).map_err(|e| ConfigError::Document(e.to_string()))?;
    config.into_spec()
}

/// Errors raised while loading a structured grammar document, before any
/// [GrammarSpec] is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document could not be deserialized into the mapping shape
    /// (missing required field, wrong type, unknown key).
    Document(String),
    MissingStart,
    /// `start` names a rule the document does not define.
    UndefinedStart(String),
    Definition(DefinitionError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Document(msg) => write!(f, "invalid grammar document: {}", msg),
            ConfigError::MissingStart => write!(f, "grammar document has no start rule"),
            ConfigError::UndefinedStart(name) => {
                write!(f, "start rule {} is not defined in the document", name)
            }
            ConfigError::Definition(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Definition(err) => Some(err),
            _ => None,
        }
    }
}
