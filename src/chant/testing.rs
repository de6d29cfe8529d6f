//! Testing utilities for AST assertions
//!
//! # Parser Testing Guidelines
//!
//! Asserting generalities like node counts is not informative: what a parser
//! test needs to pin down is the shape and content of the AST, meaning which
//! calls, in which order, with which arguments bound to which values. Writing that
//! with nested `match`es is long and brittle, so this module provides two
//! tools meant to be used together:
//!
//! 1. **Factories** ([call], [chain], [kw], [pos], [num], [text], [ident]) -
//!    build expected AST fragments without span noise.
//! 2. **[assert_program]** - a fluent assertion API over a parsed [Program].
//!
//! ```rust-example
//! use chant::chant::testing::assert_program;
//!
//! let program = parser.parse("create_task(name=\"A\")\nlist_tasks()")?;
//! assert_program(&program)
//!     .statement_count(2)
//!     .statement(0, |chain| {
//!         chain.call_count(1).call(0, |call| {
//!             call.named("create_task")
//!                 .arg_count(1)
//!                 .keyword("name", text("A"))
//!         })
//!     })
//!     .statement(1, |chain| {
//!         chain.call(0, |call| call.named("list_tasks").arg_count(0))
//!     });
//! ```
//!
//! Assertions never look at spans, so factory-built fragments compare
//! cleanly against parsed ones.

use crate::chant::ast::{Arg, Call, CallChain, Program, Value};

// --- factories ---

pub fn program(statements: Vec<CallChain>) -> Program {
    Program::new(statements)
}

pub fn chain(calls: Vec<Call>) -> CallChain {
    CallChain::new(calls)
}

pub fn call(name: &str, args: Vec<Arg>) -> Call {
    Call::new(name, args)
}

/// A `keyword=value` argument.
pub fn kw(name: &str, value: Value) -> Arg {
    Arg::keyword(name, value)
}

/// A bare positional argument.
pub fn pos(value: Value) -> Arg {
    Arg::positional(value)
}

pub fn num(n: f64) -> Value {
    Value::number(n)
}

pub fn text(s: &str) -> Value {
    Value::string(s)
}

pub fn ident(s: &str) -> Value {
    Value::ident(s)
}

// --- assertions ---

/// Entry point for fluent program assertions.
pub fn assert_program(program: &Program) -> ProgramAssertion<'_> {
    ProgramAssertion { program }
}

pub struct ProgramAssertion<'a> {
    program: &'a Program,
}

impl<'a> ProgramAssertion<'a> {
    pub fn statement_count(self, expected: usize) -> Self {
        assert_eq!(
            self.program.statements.len(),
            expected,
            "expected {} statements, got {}",
            expected,
            self.program.statements.len()
        );
        self
    }

    pub fn statement(
        self,
        index: usize,
        check: impl FnOnce(ChainAssertion<'a>) -> ChainAssertion<'a>,
    ) -> Self {
        let chain = self
            .program
            .statements
            .get(index)
            .unwrap_or_else(|| panic!("no statement at index {}", index));
        check(ChainAssertion { chain });
        self
    }
}

pub struct ChainAssertion<'a> {
    chain: &'a CallChain,
}

impl<'a> ChainAssertion<'a> {
    pub fn call_count(self, expected: usize) -> Self {
        assert_eq!(
            self.chain.calls.len(),
            expected,
            "expected {} calls in chain, got {}",
            expected,
            self.chain.calls.len()
        );
        self
    }

    pub fn call(
        self,
        index: usize,
        check: impl FnOnce(CallAssertion<'a>) -> CallAssertion<'a>,
    ) -> Self {
        let call = self
            .chain
            .calls
            .get(index)
            .unwrap_or_else(|| panic!("no call at index {}", index));
        check(CallAssertion { call });
        self
    }

    /// The call names in chain order.
    pub fn names(self, expected: &[&str]) -> Self {
        let actual: Vec<_> = self.chain.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(actual, expected, "chain call names differ");
        self
    }
}

pub struct CallAssertion<'a> {
    call: &'a Call,
}

impl CallAssertion<'_> {
    pub fn named(self, expected: &str) -> Self {
        assert_eq!(self.call.name, expected, "call name differs");
        self
    }

    pub fn arg_count(self, expected: usize) -> Self {
        assert_eq!(
            self.call.args.len(),
            expected,
            "call {}: expected {} args, got {}",
            self.call.name,
            expected,
            self.call.args.len()
        );
        self
    }

    /// Some argument binds `name` to `value` by keyword.
    pub fn keyword(self, name: &str, value: Value) -> Self {
        let found = self
            .call
            .args
            .iter()
            .find(|arg| arg.keyword.as_deref() == Some(name))
            .unwrap_or_else(|| panic!("call {} has no keyword arg {}", self.call.name, name));
        assert_eq!(
            found.value, value,
            "call {}: keyword {} bound to wrong value",
            self.call.name, name
        );
        self
    }

    /// The argument at `index` is positional with the given value.
    pub fn positional(self, index: usize, value: Value) -> Self {
        let arg = self
            .call
            .args
            .get(index)
            .unwrap_or_else(|| panic!("call {} has no arg at index {}", self.call.name, index));
        assert_eq!(
            arg.keyword, None,
            "call {}: arg {} is a keyword arg",
            self.call.name, index
        );
        assert_eq!(
            arg.value, value,
            "call {}: positional {} has wrong value",
            self.call.name, index
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertions_pass_on_matching_shape() {
        let program = program(vec![chain(vec![
            call("create_task", vec![kw("name", text("A")), pos(num(2.0))]),
            call("list_tasks", vec![]),
        ])]);
        assert_program(&program)
            .statement_count(1)
            .statement(0, |chain| {
                chain
                    .call_count(2)
                    .names(&["create_task", "list_tasks"])
                    .call(0, |call| {
                        call.named("create_task")
                            .arg_count(2)
                            .keyword("name", text("A"))
                            .positional(1, num(2.0))
                    })
                    .call(1, |call| call.named("list_tasks").arg_count(0))
            });
    }

    #[test]
    #[should_panic(expected = "no statement at index 1")]
    fn test_missing_statement_panics() {
        let program = program(vec![chain(vec![call("a", vec![])])]);
        assert_program(&program).statement(1, |chain| chain);
    }

    #[test]
    #[should_panic(expected = "call name differs")]
    fn test_wrong_name_panics() {
        let program = program(vec![chain(vec![call("a", vec![])])]);
        assert_program(&program).statement(0, |chain| chain.call(0, |call| call.named("b")));
    }
}
