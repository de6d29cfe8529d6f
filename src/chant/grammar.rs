//! Grammar definition
//!
//! Three equivalent ways to author a grammar, all producing one canonical
//! [GrammarSpec] value:
//!
//! 1. Programmatic: [GrammarBuilder] calls.
//! 2. Structured document: [GrammarConfig] mappings or YAML text.
//! 3. Raw grammar text: handed straight to a backend as an escape hatch
//!    (see [crate::chant::backend]).

pub mod builder;
pub mod config;
pub mod spec;

pub use builder::GrammarBuilder;
pub use config::{load_grammar_from_yaml, ConfigError, GrammarConfig};
pub use spec::{DefinitionError, Directive, GrammarSpec, Rule, Terminal};
