//! Main module for chant library functionality

pub mod ast;
pub mod backend;
pub mod grammar;
pub mod interp;
pub mod runtime;
pub mod testing;
pub mod verbs;

pub use ast::{Arg, Call, CallChain, Program, Value};
pub use backend::{Backend, DescentBackend, GrammarError, GrammarInput, Parser, SyntaxError};
pub use grammar::{
    load_grammar_from_yaml, ConfigError, DefinitionError, GrammarBuilder, GrammarConfig,
    GrammarSpec,
};
pub use interp::{Invocation, ResolveError};
pub use runtime::{Dsl, DslError, ExecutionError};
pub use verbs::{Action, Verb, VerbRegistry};
