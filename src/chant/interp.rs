//! Call resolution and argument binding
//!
//!     The interpreter turns parsed calls into [Invocation]s: for each call
//!     in a chain it looks the name up in the verb registry, binds keyword
//!     and positional arguments against the verb's declared parameters,
//!     fills defaults, and fails with a [ResolveError] naming the call and
//!     parameter when binding cannot complete. Resolution order is source
//!     order and is preserved through execution.
//!
//! Binding rules
//!
//!     Keyword arguments bind by parameter name. Positional arguments bind
//!     into the first unbound parameter slot, and may skip keyword-bound
//!     parameters only when every bound slot sits before the slot the
//!     positional lands in; a bound slot after it means the source order and
//!     the declared order disagree, which is an error rather than a guess.
//!     After all arguments are placed, unbound parameters take their
//!     declared default; a defaultless parameter left unbound is an error.

use std::fmt;

use crate::chant::ast::{Arg, Call, CallChain, Value};
use crate::chant::verbs::{Verb, VerbRegistry};

/// One resolved call: every parameter bound to a value, in declared
/// parameter order. This is what a verb handler receives.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub verb: String,
    pub bound: Vec<(String, Value)>,
}

impl Invocation {
    /// The value bound to a parameter.
    pub fn get(&self, param: &str) -> Option<&Value> {
        self.bound
            .iter()
            .find(|(name, _)| name == param)
            .map(|(_, value)| value)
    }

    /// Text content of a string or identifier parameter.
    pub fn text(&self, param: &str) -> Option<&str> {
        self.get(param).and_then(Value::as_str)
    }

    pub fn number(&self, param: &str) -> Option<f64> {
        self.get(param).and_then(Value::as_number)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.verb)?;
        for (i, (name, value)) in self.bound.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

/// Resolve every call in a chain, left to right. The whole chain resolves
/// before anything executes, so a bad later call is caught before an earlier
/// handler runs.
pub fn resolve(chain: &CallChain, registry: &VerbRegistry) -> Result<Vec<Invocation>, ResolveError> {
    chain
        .calls
        .iter()
        .map(|call| resolve_call(call, registry))
        .collect()
}

/// Resolve a single call against the registry.
pub fn resolve_call(call: &Call, registry: &VerbRegistry) -> Result<Invocation, ResolveError> {
    let verb = registry
        .get(&call.name)
        .ok_or_else(|| ResolveError::UnknownVerb {
            verb: call.name.clone(),
        })?;
    bind(call, verb)
}

fn bind(call: &Call, verb: &Verb) -> Result<Invocation, ResolveError> {
    let params = verb.params();
    let mut slots: Vec<Option<Value>> = vec![None; params.len()];

    for arg in &call.args {
        match arg {
            Arg {
                keyword: Some(keyword),
                value,
            } => {
                let index = params
                    .iter()
                    .position(|p| &p.name == keyword)
                    .ok_or_else(|| ResolveError::UnknownKeyword {
                        verb: call.name.clone(),
                        keyword: keyword.clone(),
                    })?;
                if slots[index].is_some() {
                    return Err(ResolveError::DuplicateBinding {
                        verb: call.name.clone(),
                        param: keyword.clone(),
                    });
                }
                slots[index] = Some(value.clone());
            }
            Arg {
                keyword: None,
                value,
            } => {
                let index = slots.iter().position(Option::is_none).ok_or_else(|| {
                    ResolveError::TooManyArguments {
                        verb: call.name.clone(),
                        expected: params.len(),
                        given: call.args.len(),
                    }
                })?;
                // A bound slot after the landing slot means a keyword named a
                // later parameter; the positional's place is no longer
                // well-defined.
                if let Some(later) = slots[index..].iter().position(Option::is_some) {
                    return Err(ResolveError::PositionalAfterKeyword {
                        verb: call.name.clone(),
                        param: params[index + later].name.clone(),
                    });
                }
                slots[index] = Some(value.clone());
            }
        }
    }

    let mut bound = Vec::with_capacity(params.len());
    for (param, slot) in params.iter().zip(slots) {
        let value = match (slot, &param.default) {
            (Some(value), _) => value,
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(ResolveError::MissingArgument {
                    verb: call.name.clone(),
                    param: param.name.clone(),
                });
            }
        };
        bound.push((param.name.clone(), value));
    }

    Ok(Invocation {
        verb: call.name.clone(),
        bound,
    })
}

/// Errors raised while resolving parsed calls against the verb registry,
/// before any handler runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// The call name has no registered verb.
    UnknownVerb { verb: String },
    /// A keyword argument names a parameter the verb does not declare.
    UnknownKeyword { verb: String, keyword: String },
    /// The same parameter was bound twice.
    DuplicateBinding { verb: String, param: String },
    /// A defaultless parameter was left unbound.
    MissingArgument { verb: String, param: String },
    /// More positional arguments than free parameter slots.
    TooManyArguments {
        verb: String,
        expected: usize,
        given: usize,
    },
    /// A positional argument would land before a keyword-bound parameter.
    PositionalAfterKeyword { verb: String, param: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnknownVerb { verb } => write!(f, "unknown verb: {}", verb),
            ResolveError::UnknownKeyword { verb, keyword } => {
                write!(f, "{} has no parameter named {}", verb, keyword)
            }
            ResolveError::DuplicateBinding { verb, param } => {
                write!(f, "{} binds parameter {} more than once", verb, param)
            }
            ResolveError::MissingArgument { verb, param } => {
                write!(f, "{} is missing required argument {}", verb, param)
            }
            ResolveError::TooManyArguments {
                verb,
                expected,
                given,
            } => write!(
                f,
                "{} takes at most {} arguments, got {}",
                verb, expected, given
            ),
            ResolveError::PositionalAfterKeyword { verb, param } => {
                write!(
                    f,
                    "{}: positional argument conflicts with keyword-bound {}",
                    verb, param
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chant::verbs::HandlerResult;

    fn noop() -> impl FnMut(&Invocation) -> HandlerResult {
        |_| Ok(None)
    }

    /// f(x, y="default")
    fn registry() -> VerbRegistry {
        let mut registry = VerbRegistry::new();
        registry
            .register(
                Verb::new("f", noop())
                    .param("x")
                    .param_default("y", Value::string("default")),
            )
            .unwrap();
        registry
    }

    fn call(name: &str, args: Vec<Arg>) -> Call {
        Call::new(name, args)
    }

    #[test]
    fn test_keyword_binding_with_default() {
        let inv = resolve_call(
            &call("f", vec![Arg::keyword("x", Value::number(1.0))]),
            &registry(),
        )
        .unwrap();
        assert_eq!(
            inv.bound,
            vec![
                ("x".to_string(), Value::number(1.0)),
                ("y".to_string(), Value::string("default")),
            ]
        );
    }

    #[test]
    fn test_positional_binding_matches_keyword_binding() {
        let registry = registry();
        let by_pos = resolve_call(
            &call("f", vec![Arg::positional(Value::number(1.0))]),
            &registry,
        )
        .unwrap();
        let by_kw = resolve_call(
            &call("f", vec![Arg::keyword("x", Value::number(1.0))]),
            &registry,
        )
        .unwrap();
        assert_eq!(by_pos, by_kw);
    }

    #[test]
    fn test_missing_required_argument_named() {
        let err = resolve_call(
            &call("f", vec![Arg::keyword("y", Value::number(2.0))]),
            &registry(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingArgument {
                verb: "f".into(),
                param: "x".into()
            }
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let err = resolve_call(
            &call(
                "f",
                vec![
                    Arg::positional(Value::number(1.0)),
                    Arg::positional(Value::number(2.0)),
                    Arg::positional(Value::number(3.0)),
                ],
            ),
            &registry(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::TooManyArguments {
                verb: "f".into(),
                expected: 2,
                given: 3
            }
        );
    }

    #[test]
    fn test_positional_after_earlier_keyword_is_consistent() {
        // f(x=1, 2): the keyword bound slot 0, the positional lands in 1.
        let inv = resolve_call(
            &call(
                "f",
                vec![
                    Arg::keyword("x", Value::number(1.0)),
                    Arg::positional(Value::number(2.0)),
                ],
            ),
            &registry(),
        )
        .unwrap();
        assert_eq!(inv.get("y"), Some(&Value::number(2.0)));
    }

    #[test]
    fn test_positional_before_keyword_bound_slot_fails() {
        // f(y=1, 2): the positional would land in x, behind the bound y.
        let err = resolve_call(
            &call(
                "f",
                vec![
                    Arg::keyword("y", Value::number(1.0)),
                    Arg::positional(Value::number(2.0)),
                ],
            ),
            &registry(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::PositionalAfterKeyword {
                verb: "f".into(),
                param: "y".into()
            }
        );
    }

    #[test]
    fn test_duplicate_binding_fails() {
        let err = resolve_call(
            &call(
                "f",
                vec![
                    Arg::keyword("x", Value::number(1.0)),
                    Arg::keyword("x", Value::number(2.0)),
                ],
            ),
            &registry(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::DuplicateBinding {
                verb: "f".into(),
                param: "x".into()
            }
        );
    }

    #[test]
    fn test_unknown_keyword_fails() {
        let err = resolve_call(
            &call(
                "f",
                vec![
                    Arg::positional(Value::number(1.0)),
                    Arg::keyword("z", Value::number(2.0)),
                ],
            ),
            &registry(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownKeyword {
                verb: "f".into(),
                keyword: "z".into()
            }
        );
    }

    #[test]
    fn test_unknown_verb_named() {
        let err = resolve_call(&call("delete_task", vec![]), &registry()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownVerb {
                verb: "delete_task".into()
            }
        );
    }

    #[test]
    fn test_chain_resolves_in_source_order() {
        let mut registry = VerbRegistry::new();
        for name in ["a", "b", "c"] {
            registry.register(Verb::new(name, noop())).unwrap();
        }
        let chain = CallChain::new(vec![
            call("a", vec![]),
            call("b", vec![]),
            call("c", vec![]),
        ]);
        let invocations = resolve(&chain, &registry).unwrap();
        let order: Vec<_> = invocations.iter().map(|i| i.verb.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn test_chain_fails_on_first_unknown() {
        let registry = registry();
        let chain = CallChain::new(vec![call("f", vec![]), call("g", vec![])]);
        // f is missing x, so the chain fails there before reaching g.
        let err = resolve(&chain, &registry).unwrap_err();
        assert!(matches!(err, ResolveError::MissingArgument { .. }));
    }
}
