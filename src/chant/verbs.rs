//! Verb registry
//!
//!     A verb is a named operation with a declared parameter signature and a
//!     handler. Registration happens once, when the DSL value is
//!     constructed; duplicate verb names and malformed signatures fail with
//!     [DefinitionError] before any parsing occurs.
//!
//! Handler policy
//!
//!     A handler either performs its side effect directly and returns
//!     `Ok(None)`, or returns `Ok(Some(Action))` to describe the effect and
//!     let the runtime's action applier perform it. Both styles may be mixed
//!     within one registry, per verb.

use std::collections::HashMap;
use std::fmt;

use crate::chant::ast::Value;
use crate::chant::grammar::DefinitionError;
use crate::chant::interp::Invocation;

/// Boxed error type handlers may fail with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler returns: nothing (effect already performed) or an action
/// for the runtime to apply.
pub type HandlerResult = Result<Option<Action>, HandlerError>;

/// A verb handler. `FnMut` so hosts can capture mutable state in closures;
/// the engine is single-threaded and runs at most one call at a time.
pub type Handler = Box<dyn FnMut(&Invocation) -> HandlerResult>;

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Value>,
}

/// A declarative effect description, decoupled from performing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: String,
    pub payload: Vec<(String, Value)>,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.payload.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.payload
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, (name, value)) in self.payload.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

/// A named operation: handler plus parameter signature.
pub struct Verb {
    name: String,
    params: Vec<Param>,
    handler: Handler,
}

impl Verb {
    pub fn new(
        name: impl Into<String>,
        handler: impl FnMut(&Invocation) -> HandlerResult + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Declare a required parameter. Declaration order is binding order.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Declare a parameter with a default value.
    pub fn param_default(mut self, name: impl Into<String>, default: Value) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: Some(default),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Invoke the handler with bound arguments.
    pub fn call(&mut self, invocation: &Invocation) -> HandlerResult {
        (self.handler)(invocation)
    }

    /// Signature validity: unique parameter names, no required parameter
    /// after a defaulted one.
    fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen_default = false;
        for (i, param) in self.params.iter().enumerate() {
            if self.params[..i].iter().any(|p| p.name == param.name) {
                return Err(DefinitionError::DuplicateParameter {
                    verb: self.name.clone(),
                    param: param.name.clone(),
                });
            }
            match &param.default {
                Some(_) => seen_default = true,
                None if seen_default => {
                    return Err(DefinitionError::RequiredAfterDefaulted {
                        verb: self.name.clone(),
                        param: param.name.clone(),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verb")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// The verb table owned by one DSL value.
#[derive(Debug, Default)]
pub struct VerbRegistry {
    verbs: Vec<Verb>,
    index: HashMap<String, usize>,
}

impl VerbRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a verb. Fails on a duplicate name or a malformed signature.
    pub fn register(&mut self, verb: Verb) -> Result<(), DefinitionError> {
        verb.validate()?;
        if self.index.contains_key(verb.name()) {
            return Err(DefinitionError::DuplicateVerb(verb.name().to_string()));
        }
        self.index.insert(verb.name().to_string(), self.verbs.len());
        self.verbs.push(verb);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Verb> {
        self.index.get(name).map(|&i| &self.verbs[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Verb> {
        let i = *self.index.get(name)?;
        Some(&mut self.verbs[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.verbs.iter().map(|v| v.name())
    }

    pub fn len(&self) -> usize {
        self.verbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> impl FnMut(&Invocation) -> HandlerResult {
        |_| Ok(None)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = VerbRegistry::new();
        registry
            .register(Verb::new("create_task", noop()).param("name"))
            .unwrap();
        assert!(registry.get("create_task").is_some());
        assert!(registry.get("delete_task").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_verb_rejected() {
        let mut registry = VerbRegistry::new();
        registry.register(Verb::new("track", noop())).unwrap();
        let err = registry.register(Verb::new("track", noop())).unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateVerb("track".into()));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let mut registry = VerbRegistry::new();
        let err = registry
            .register(Verb::new("go", noop()).param("x").param("x"))
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateParameter {
                verb: "go".into(),
                param: "x".into()
            }
        );
    }

    #[test]
    fn test_required_after_defaulted_rejected() {
        let mut registry = VerbRegistry::new();
        let err = registry
            .register(
                Verb::new("go", noop())
                    .param_default("speed", Value::Number(1.0))
                    .param("target"),
            )
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::RequiredAfterDefaulted {
                verb: "go".into(),
                param: "target".into()
            }
        );
    }

    #[test]
    fn test_action_fields() {
        let action = Action::new("create_task")
            .field("name", Value::string("A"))
            .field("priority", Value::string("high"));
        assert_eq!(action.get("name"), Some(&Value::string("A")));
        assert_eq!(action.get("missing"), None);
        assert_eq!(
            action.to_string(),
            "create_task(name=\"A\", priority=\"high\")"
        );
    }
}
