//! Grammar text rendering
//!
//! Turns a [GrammarSpec] back into grammar text (rules, then terminals, then
//! directives, declaration order preserved) and reduces grammar text to a
//! standalone CFG for external constrained generators by stripping the
//! backend-only directive lines.

use crate::chant::grammar::GrammarSpec;

/// Render a spec as grammar text.
///
/// Literal terminal patterns are quoted and escaped; regex patterns are kept
/// slash-wrapped as written. Descriptions render as trailing `//` comments
/// when present.
pub fn render(spec: &GrammarSpec) -> String {
    let mut out = String::new();
    for rule in spec.rules() {
        out.push_str(&rule.name);
        out.push_str(": ");
        out.push_str(&rule.definition);
        push_comment(&mut out, &rule.description);
        out.push('\n');
    }
    for term in spec.terminals() {
        out.push_str(&term.name);
        out.push_str(": ");
        if term.is_regex() {
            out.push_str(&term.pattern);
        } else {
            out.push_str(&format!("{:?}", term.pattern));
        }
        push_comment(&mut out, &term.description);
        out.push('\n');
    }
    if !spec.directives().is_empty() {
        out.push('\n');
        for directive in spec.directives() {
            out.push_str(directive.as_str());
            out.push('\n');
        }
    }
    out
}

fn push_comment(out: &mut String, description: &str) {
    if !description.is_empty() {
        out.push_str("  // ");
        out.push_str(description);
    }
}

/// Strip backend-only directive lines (`%import`, `%ignore`, ...) so the
/// remaining text is a standalone CFG an external generator can consume.
///
/// Syntax-preserving: every non-directive line is kept byte-identical,
/// including its line ending.
pub fn clean_for_external_grammar(grammar_text: &str) -> String {
    let mut out = String::with_capacity(grammar_text.len());
    for line in grammar_text.split_inclusive('\n') {
        if !line.trim_start().starts_with('%') {
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chant::grammar::GrammarBuilder;

    #[test]
    fn test_render_canonical_grammar() {
        let text = render(&GrammarBuilder::default_grammar());
        assert!(text.contains("call_chain: call (DOT call)*"));
        assert!(text.contains("DOT: \".\""));
        assert!(text.contains("NUMBER: /-?\\d+(\\.\\d+)?/"));
        assert!(text.contains("%ignore WS_INLINE"));
    }

    #[test]
    fn test_clean_strips_only_directive_lines() {
        let text = "start: call_chain\ncall: IDENTIFIER\n%import common.WS\n%ignore WS\n";
        let cleaned = clean_for_external_grammar(text);
        assert_eq!(cleaned, "start: call_chain\ncall: IDENTIFIER\n");
    }

    #[test]
    fn test_clean_preserves_indented_and_blank_lines() {
        let text = "a: B\n\n  %ignore WS\nB: \"b\"";
        let cleaned = clean_for_external_grammar(text);
        assert_eq!(cleaned, "a: B\n\nB: \"b\"");
    }

    #[test]
    fn test_cleaned_canonical_grammar_has_no_directives() {
        let text = render(&GrammarBuilder::default_grammar());
        let cleaned = clean_for_external_grammar(&text);
        assert!(!cleaned.contains('%'));
        assert!(cleaned.contains("call_chain: call (DOT call)*"));
    }
}
