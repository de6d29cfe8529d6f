//! Programmatic grammar construction
//!
//!     The builder is the hand-written-text equivalent: the same rule,
//!     terminal, and directive entries, appended in declaration order, then
//!     validated and frozen into a [GrammarSpec] by `build`. Name-uniqueness
//!     violations surface at `build` time as [DefinitionError].

use super::spec::{DefinitionError, Directive, GrammarSpec, Rule, Terminal};

/// Fluent construction of a [GrammarSpec].
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    start: Option<String>,
    rules: Vec<Rule>,
    terminals: Vec<Terminal>,
    directives: Vec<Directive>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start rule. Defaults to the first declared rule.
    pub fn start(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    /// Append a production rule.
    pub fn rule(
        mut self,
        name: impl Into<String>,
        definition: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.rules.push(Rule::new(name, definition, description));
        self
    }

    /// Append a terminal. Slash-wrapped patterns are regexes, anything else
    /// is a literal.
    pub fn terminal(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.terminals
            .push(Terminal::new(name, pattern, description));
        self
    }

    /// Append an opaque backend directive.
    pub fn directive(mut self, text: impl Into<String>) -> Self {
        self.directives.push(Directive::new(text));
        self
    }

    /// Validate and freeze into a spec.
    pub fn build(self) -> Result<GrammarSpec, DefinitionError> {
        let start = self
            .start
            .or_else(|| self.rules.first().map(|r| r.name.clone()))
            .unwrap_or_else(|| "start".to_string());
        GrammarSpec::new(start, self.rules, self.terminals, self.directives)
    }

    /// The canonical call-chain grammar.
    ///
    /// A program is one or more newline-separated statements; each statement
    /// is a dot-chained sequence of `identifier(args)` calls; args are
    /// `keyword=value` or positional; values are numbers, double-quoted
    /// strings, or bare identifiers. Inline whitespace is ignored, newlines
    /// separate statements, and runs of blank lines collapse into one
    /// NEWLINE token.
    pub fn default_grammar() -> GrammarSpec {
        Self::new()
            .rule(
                "start",
                "NEWLINE* call_chain (NEWLINE+ call_chain)* NEWLINE*",
                "Entry point: newline-separated statements",
            )
            .rule("call_chain", "call (DOT call)*", "Chain of calls")
            .rule("call", "IDENTIFIER \"(\" args? \")\"", "Function call")
            .rule("args", "arg (COMMA arg)*", "Arguments")
            .rule("arg", "IDENTIFIER \"=\" value | value", "Argument")
            .rule("value", "NUMBER | STRING | IDENTIFIER", "Value")
            .terminal("DOT", ".", "Dot separator")
            .terminal("COMMA", ",", "Comma separator")
            .terminal("NUMBER", "/-?\\d+(\\.\\d+)?/", "Number")
            .terminal("STRING", "/\"([^\"\\\\]|\\\\.)*\"/", "String")
            .terminal("IDENTIFIER", "/[a-zA-Z_][a-zA-Z0-9_]*/", "Identifier")
            .terminal("NEWLINE", "/(\\r?\\n)+/", "Statement separator")
            .directive("%import common.WS_INLINE")
            .directive("%ignore WS_INLINE")
            .build()
            .expect("canonical grammar is well-formed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_in_declaration_order() {
        let spec = GrammarBuilder::new()
            .rule("start", "A B", "")
            .terminal("A", "a", "")
            .terminal("B", "b", "")
            .build()
            .unwrap();
        assert_eq!(spec.start(), "start");
        let names: Vec<_> = spec.terminals().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn test_duplicate_rule_fails_at_build() {
        let err = GrammarBuilder::new()
            .rule("start", "A", "")
            .rule("start", "B", "")
            .build();
        assert_eq!(err, Err(DefinitionError::DuplicateRule("start".into())));
    }

    #[test]
    fn test_start_defaults_to_first_rule() {
        let spec = GrammarBuilder::new()
            .rule("program", "WORD", "")
            .terminal("WORD", "/\\w+/", "")
            .build()
            .unwrap();
        assert_eq!(spec.start(), "program");
    }

    #[test]
    fn test_default_grammar_shape() {
        let spec = GrammarBuilder::default_grammar();
        assert_eq!(spec.start(), "start");
        assert!(spec.rule("call_chain").is_some());
        assert!(spec.rule("call").is_some());
        assert!(spec.terminal("IDENTIFIER").is_some());
        assert!(spec.terminal("NEWLINE").is_some());
        assert_eq!(spec.directives().len(), 2);
    }
}
