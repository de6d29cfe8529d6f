//! Argument binding matrix
//!
//! Parameterized cases over a verb `f(x, y="default")` plus a no-parameter
//! verb, covering keyword binding, positional binding, defaults, and every
//! binding failure the interpreter distinguishes.

use rstest::rstest;

use chant::chant::ast::Value;
use chant::chant::interp::{self, Invocation, ResolveError};
use chant::chant::runtime::Dsl;
use chant::chant::verbs::{Verb, VerbRegistry};

/// f(x, y="default") and g().
fn dsl() -> Dsl {
    let mut registry = VerbRegistry::new();
    registry
        .register(
            Verb::new("f", |_: &Invocation| Ok(None))
                .param("x")
                .param_default("y", Value::string("default")),
        )
        .unwrap();
    registry.register(Verb::new("g", |_| Ok(None))).unwrap();
    Dsl::new(registry).unwrap()
}

fn resolve_one(source: &str) -> Result<Invocation, ResolveError> {
    let dsl = dsl();
    let program = dsl.parse(source).unwrap();
    let mut invocations = interp::resolve(&program.statements[0], dsl.registry())?;
    assert_eq!(invocations.len(), 1);
    Ok(invocations.remove(0))
}

fn bound(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[rstest]
#[case::keyword("f(x=1)", &[("x", Value::Number(1.0)), ("y", Value::string("default"))])]
#[case::positional("f(1)", &[("x", Value::Number(1.0)), ("y", Value::string("default"))])]
#[case::both_positional("f(1, 2)", &[("x", Value::Number(1.0)), ("y", Value::Number(2.0))])]
#[case::both_keyword("f(y=2, x=1)", &[("x", Value::Number(1.0)), ("y", Value::Number(2.0))])]
#[case::keyword_then_positional("f(x=1, 2)", &[("x", Value::Number(1.0)), ("y", Value::Number(2.0))])]
#[case::string_value("f(x=\"a b\")", &[("x", Value::string("a b")), ("y", Value::string("default"))])]
#[case::ident_value("f(x=ref)", &[("x", Value::ident("ref")), ("y", Value::string("default"))])]
#[case::no_params("g()", &[])]
fn test_binds(#[case] source: &str, #[case] expected: &[(&str, Value)]) {
    let invocation = resolve_one(source).unwrap();
    assert_eq!(invocation.bound, bound(expected));
}

#[rstest]
#[case::missing_required("f(y=2)", ResolveError::MissingArgument { verb: "f".into(), param: "x".into() })]
#[case::no_args_at_all("f()", ResolveError::MissingArgument { verb: "f".into(), param: "x".into() })]
#[case::too_many("f(1, 2, 3)", ResolveError::TooManyArguments { verb: "f".into(), expected: 2, given: 3 })]
#[case::extra_on_no_params("g(1)", ResolveError::TooManyArguments { verb: "g".into(), expected: 0, given: 1 })]
#[case::unknown_keyword("f(z=1)", ResolveError::UnknownKeyword { verb: "f".into(), keyword: "z".into() })]
#[case::duplicate_keyword("f(x=1, x=2)", ResolveError::DuplicateBinding { verb: "f".into(), param: "x".into() })]
#[case::positional_into_bound_slot("f(1, x=2)", ResolveError::DuplicateBinding { verb: "f".into(), param: "x".into() })]
#[case::positional_behind_keyword("f(y=1, 2)", ResolveError::PositionalAfterKeyword { verb: "f".into(), param: "y".into() })]
fn test_binding_failures(#[case] source: &str, #[case] expected: ResolveError) {
    let err = resolve_one(source).unwrap_err();
    assert_eq!(err, expected);
}

#[test]
fn test_number_conversion_happens_before_binding() {
    let invocation = resolve_one("f(x=-1.5)").unwrap();
    assert_eq!(invocation.number("x"), Some(-1.5));
}

#[test]
fn test_string_escapes_decoded_before_binding() {
    let invocation = resolve_one(r#"f(x="a\nb")"#).unwrap();
    assert_eq!(invocation.text("x"), Some("a\nb"));
}
