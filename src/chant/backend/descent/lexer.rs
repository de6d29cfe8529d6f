//! Runtime lexer
//!
//!     Compiled from the grammar's terminals at backend-compile time: named
//!     terminals (literal or regex) in declaration order, then the anonymous
//!     literals harvested from rule definitions. At each position every live
//!     terminal is tried and the longest match wins; ties prefer literals
//!     over regexes, then earlier declaration. Terminals in the ignore set
//!     are matched and dropped.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use crate::chant::backend::SyntaxError;

/// Identity of a terminal: declared by name, or an anonymous quoted literal
/// from a rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermId {
    Named(String),
    Anon(String),
}

impl TermId {
    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, TermId::Named(n) if n == name)
    }

    pub fn is_anon(&self, text: &str) -> bool {
        matches!(self, TermId::Anon(t) if t == text)
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermId::Named(name) => write!(f, "{}", name),
            TermId::Anon(text) => write!(f, "{:?}", text),
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Pattern(Regex),
}

/// One lexable terminal.
#[derive(Debug, Clone)]
pub struct LexRule {
    id: TermId,
    matcher: Matcher,
}

impl LexRule {
    pub fn literal(id: TermId, text: impl Into<String>) -> Self {
        Self {
            id,
            matcher: Matcher::Literal(text.into()),
        }
    }

    pub fn pattern(id: TermId, regex: Regex) -> Self {
        Self {
            id,
            matcher: Matcher::Pattern(regex),
        }
    }

    /// Match length at the start of `rest`, if any.
    fn match_len(&self, rest: &str) -> Option<usize> {
        match &self.matcher {
            Matcher::Literal(text) => rest.starts_with(text.as_str()).then(|| text.len()),
            Matcher::Pattern(regex) => regex.find(rest).map(|m| m.end()),
        }
    }

    fn is_literal(&self) -> bool {
        matches!(self.matcher, Matcher::Literal(_))
    }
}

/// One lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tok {
    pub term: TermId,
    pub text: String,
    pub span: Range<usize>,
}

/// The compiled terminal set.
#[derive(Debug, Clone)]
pub struct CompiledLexer {
    rules: Vec<LexRule>,
    ignore: HashSet<String>,
}

impl CompiledLexer {
    pub fn new(rules: Vec<LexRule>, ignore: HashSet<String>) -> Self {
        Self { rules, ignore }
    }

    /// Tokenize source text. Fails with a positioned [SyntaxError] when no
    /// terminal matches at some position.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Tok>, SyntaxError> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < source.len() {
            let rest = &source[pos..];
            // Longest match wins; ties prefer literals over regexes, then
            // earlier declaration. Zero-length matches would stall the lexer.
            let mut best: Option<(usize, usize)> = None;
            for (idx, rule) in self.rules.iter().enumerate() {
                let Some(len) = rule.match_len(rest) else {
                    continue;
                };
                if len == 0 {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_idx, best_len)) => {
                        len > best_len
                            || (len == best_len
                                && rule.is_literal()
                                && !self.rules[best_idx].is_literal())
                    }
                };
                if better {
                    best = Some((idx, len));
                }
            }
            match best {
                Some((idx, len)) => {
                    let rule = &self.rules[idx];
                    let span = pos..pos + len;
                    let skip = matches!(&rule.id, TermId::Named(name) if self.ignore.contains(name));
                    if !skip {
                        tokens.push(Tok {
                            term: rule.id.clone(),
                            text: source[span.clone()].to_string(),
                            span: span.clone(),
                        });
                    }
                    pos += len;
                }
                None => {
                    let found = rest.chars().next().map(|c| c.to_string());
                    let mut err = SyntaxError::new(source, pos, "unexpected character");
                    err.found = found.map(|c| format!("{:?}", c));
                    return Err(err);
                }
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexer() -> CompiledLexer {
        let rules = vec![
            LexRule::literal(TermId::Named("DOT".into()), "."),
            LexRule::pattern(
                TermId::Named("NUMBER".into()),
                Regex::new(r"\A(?:-?\d+(\.\d+)?)").unwrap(),
            ),
            LexRule::pattern(
                TermId::Named("IDENTIFIER".into()),
                Regex::new(r"\A(?:[a-zA-Z_][a-zA-Z0-9_]*)").unwrap(),
            ),
            LexRule::pattern(
                TermId::Named("WS".into()),
                Regex::new(r"\A(?:[ \t]+)").unwrap(),
            ),
            LexRule::literal(TermId::Anon("(".into()), "("),
            LexRule::literal(TermId::Anon(")".into()), ")"),
        ];
        CompiledLexer::new(rules, HashSet::from(["WS".to_string()]))
    }

    fn kinds(tokens: &[Tok]) -> Vec<String> {
        tokens.iter().map(|t| t.term.to_string()).collect()
    }

    #[test]
    fn test_tokenizes_call() {
        let tokens = lexer().tokenize("track(42)").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec!["IDENTIFIER", "\"(\"", "NUMBER", "\")\""]
        );
        assert_eq!(tokens[0].text, "track");
        assert_eq!(tokens[2].span, 6..8);
    }

    #[test]
    fn test_ignored_terminal_dropped() {
        let tokens = lexer().tokenize("a . b").unwrap();
        assert_eq!(kinds(&tokens), vec!["IDENTIFIER", "DOT", "IDENTIFIER"]);
    }

    #[test]
    fn test_longest_match_wins() {
        // "-" alone is not a token here, but "-3.5" is one NUMBER.
        let tokens = lexer().tokenize("-3.5").unwrap();
        assert_eq!(kinds(&tokens), vec!["NUMBER"]);
        assert_eq!(tokens[0].text, "-3.5");
    }

    #[test]
    fn test_unexpected_character() {
        let err = lexer().tokenize("a # b").unwrap_err();
        assert_eq!((err.line, err.column), (1, 3));
        assert_eq!(err.found.as_deref(), Some("\"#\""));
    }

    #[test]
    fn test_number_dot_disambiguation() {
        // "1.5" lexes as one NUMBER, not NUMBER DOT NUMBER.
        let tokens = lexer().tokenize("1.5").unwrap();
        assert_eq!(kinds(&tokens), vec!["NUMBER"]);
    }
}
