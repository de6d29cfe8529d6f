//! DSL runtime facade
//!
//!     A DSL definition is a value, not a subclass: a [Dsl] owns the verb
//!     registry, the backend, the parser compiled from the chosen grammar,
//!     and an optional action applier. Constructing the value is defining
//!     the DSL; [Dsl::execute] is the single entry point that drives
//!     parse → resolve → dispatch over source text.
//!
//! Failure semantics
//!
//!     Any failure aborts the remainder of the current chain and every
//!     later statement, and propagates to the caller as a [DslError].
//!     Side effects already performed by earlier calls are not rolled
//!     back; there is no transaction guarantee. The engine never logs and
//!     continues, and never retries.

use std::fmt;

use crate::chant::ast::Program;
use crate::chant::backend::{
    Backend, DescentBackend, GrammarError, GrammarInput, Parser, SyntaxError,
};
use crate::chant::grammar::{GrammarBuilder, GrammarSpec};
use crate::chant::interp::{self, ResolveError};
use crate::chant::verbs::{Action, HandlerError, VerbRegistry};

/// Applies the [Action]s that action-returning verbs produce. `FnMut` for
/// the same reason handlers are: hosts capture mutable state in closures.
pub type ActionApplier = Box<dyn FnMut(&Action) -> Result<(), HandlerError>>;

/// A complete DSL definition: verbs, grammar, backend, and the execution
/// entry point.
pub struct Dsl {
    registry: VerbRegistry,
    backend: Box<dyn Backend>,
    parser: Box<dyn Parser>,
    applier: Option<ActionApplier>,
}

impl Dsl {
    /// Define a DSL over the canonical call-chain grammar with the built-in
    /// descent backend.
    pub fn new(registry: VerbRegistry) -> Result<Self, GrammarError> {
        Self::with_spec(registry, &GrammarBuilder::default_grammar())
    }

    /// Define a DSL over a custom grammar spec.
    pub fn with_spec(registry: VerbRegistry, spec: &GrammarSpec) -> Result<Self, GrammarError> {
        Self::with_backend(registry, Box::new(DescentBackend::new()), GrammarInput::Spec(spec))
    }

    /// Define a DSL over hand-authored grammar text.
    pub fn with_grammar_text(registry: VerbRegistry, text: &str) -> Result<Self, GrammarError> {
        Self::with_backend(registry, Box::new(DescentBackend::new()), GrammarInput::Text(text))
    }

    /// Define a DSL over an explicit backend and grammar. Compilation
    /// happens here, so a bad grammar fails before any source is accepted.
    pub fn with_backend(
        registry: VerbRegistry,
        backend: Box<dyn Backend>,
        input: GrammarInput<'_>,
    ) -> Result<Self, GrammarError> {
        let parser = backend.compile(input)?;
        Ok(Self {
            registry,
            backend,
            parser,
            applier: None,
        })
    }

    /// Install the applier that performs action-returning verbs' effects.
    /// Without one, a verb returning an action is an [ExecutionError].
    pub fn apply_actions_with(
        mut self,
        applier: impl FnMut(&Action) -> Result<(), HandlerError> + 'static,
    ) -> Self {
        self.applier = Some(Box::new(applier));
        self
    }

    /// Parse source text without executing it.
    pub fn parse(&self, source: &str) -> Result<Program, SyntaxError> {
        self.parser.parse(source)
    }

    /// Execute DSL source text: parse the whole program, then resolve and
    /// dispatch each statement's calls in source order. Each chain is fully
    /// resolved before its first handler runs, so a malformed later call in
    /// the same chain is caught before any of the chain's effects happen;
    /// effects of earlier statements stay applied when a later one fails.
    pub fn execute(&mut self, source: &str) -> Result<(), DslError> {
        let program = self.parser.parse(source)?;
        for chain in &program.statements {
            let invocations = interp::resolve(chain, &self.registry)?;
            for invocation in invocations {
                let verb = self
                    .registry
                    .get_mut(&invocation.verb)
                    .ok_or_else(|| ResolveError::UnknownVerb {
                        verb: invocation.verb.clone(),
                    })?;
                let outcome = verb.call(&invocation).map_err(|cause| {
                    ExecutionError::HandlerFailed {
                        verb: invocation.verb.clone(),
                        cause,
                    }
                })?;
                if let Some(action) = outcome {
                    self.apply(&invocation.verb, &action)?;
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, verb: &str, action: &Action) -> Result<(), ExecutionError> {
        match &mut self.applier {
            Some(applier) => {
                applier(action).map_err(|cause| ExecutionError::ApplyFailed {
                    verb: verb.to_string(),
                    kind: action.kind.clone(),
                    cause,
                })
            }
            None => Err(ExecutionError::UnappliedAction {
                verb: verb.to_string(),
                kind: action.kind.clone(),
            }),
        }
    }

    pub fn registry(&self) -> &VerbRegistry {
        &self.registry
    }

    /// The active grammar as backend grammar text.
    pub fn grammar_text(&self) -> &str {
        self.parser.grammar_text()
    }

    /// The active grammar reduced to a standalone CFG for an external
    /// constrained generator: directive lines stripped, everything else
    /// byte-identical.
    pub fn external_grammar(&self) -> String {
        self.backend
            .clean_for_external_grammar(self.parser.grammar_text())
    }
}

impl fmt::Debug for Dsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dsl")
            .field("verbs", &self.registry.names().collect::<Vec<_>>())
            .field("has_applier", &self.applier.is_some())
            .finish_non_exhaustive()
    }
}

/// A registered handler failed while performing its effect, or produced an
/// action the runtime could not apply. The underlying cause is preserved
/// through `source()`, never swallowed.
#[derive(Debug)]
pub enum ExecutionError {
    HandlerFailed { verb: String, cause: HandlerError },
    ApplyFailed {
        verb: String,
        kind: String,
        cause: HandlerError,
    },
    /// A verb returned an action but no applier is installed.
    UnappliedAction { verb: String, kind: String },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::HandlerFailed { verb, cause } => {
                write!(f, "verb {} failed: {}", verb, cause)
            }
            ExecutionError::ApplyFailed { verb, kind, cause } => {
                write!(f, "applying action {} from verb {} failed: {}", kind, verb, cause)
            }
            ExecutionError::UnappliedAction { verb, kind } => {
                write!(
                    f,
                    "verb {} returned action {} but no applier is installed",
                    verb, kind
                )
            }
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutionError::HandlerFailed { cause, .. }
            | ExecutionError::ApplyFailed { cause, .. } => Some(cause.as_ref()),
            ExecutionError::UnappliedAction { .. } => None,
        }
    }
}

/// Everything [Dsl::execute] can fail with.
#[derive(Debug)]
pub enum DslError {
    Syntax(SyntaxError),
    Resolve(ResolveError),
    Execution(ExecutionError),
}

impl fmt::Display for DslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DslError::Syntax(err) => write!(f, "{}", err),
            DslError::Resolve(err) => write!(f, "{}", err),
            DslError::Execution(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DslError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DslError::Syntax(err) => Some(err),
            DslError::Resolve(err) => Some(err),
            DslError::Execution(err) => Some(err),
        }
    }
}

impl From<SyntaxError> for DslError {
    fn from(err: SyntaxError) -> Self {
        DslError::Syntax(err)
    }
}

impl From<ResolveError> for DslError {
    fn from(err: ResolveError) -> Self {
        DslError::Resolve(err)
    }
}

impl From<ExecutionError> for DslError {
    fn from(err: ExecutionError) -> Self {
        DslError::Execution(err)
    }
}
