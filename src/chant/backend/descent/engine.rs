//! Descent parse engine
//!
//!     Interprets the grammar's expression trees directly against the token
//!     stream: backtracking recursive descent with ordered alternation (the
//!     first matching branch commits). No code is generated; the grammar
//!     stays data all the way down.
//!
//! Failure reporting
//!
//!     The engine records the furthest token position any branch reached and
//!     the set of terminal names expected there. That position, not the
//!     point where the last alternative gave up, is what makes a useful
//!     syntax error.

use std::collections::{BTreeSet, HashMap};

use super::lexer::Tok;
use crate::chant::backend::expr::Expr;

/// Recursion guard: generous for call-chain grammars, small enough to fail
/// fast when a grammar loops through mutually recursive rules.
const MAX_DEPTH: usize = 128;

/// A parse tree node: one rule application and its matched children.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub rule: String,
    pub children: Vec<Child>,
}

/// Parse tree child: a nested rule node or a consumed token.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(ParseNode),
    Token(Tok),
}

/// Where and what the parse failed to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Token index of the furthest failure.
    pub at: usize,
    /// Terminal names that would have been accepted there.
    pub expected: BTreeSet<String>,
}

pub struct Engine<'g> {
    rules: &'g HashMap<String, Expr>,
    toks: &'g [Tok],
    furthest: usize,
    expected: BTreeSet<String>,
}

impl<'g> Engine<'g> {
    /// Run the start rule over the whole token stream. All tokens must be
    /// consumed.
    pub fn run(
        rules: &'g HashMap<String, Expr>,
        start: &str,
        toks: &'g [Tok],
    ) -> Result<ParseNode, Failure> {
        let mut engine = Engine {
            rules,
            toks,
            furthest: 0,
            expected: BTreeSet::new(),
        };
        match engine.parse_rule(start, 0, 0) {
            Some((node, next)) if next == toks.len() => Ok(node),
            Some((_, next)) => {
                engine.record(next, "end of input");
                Err(engine.into_failure())
            }
            None => Err(engine.into_failure()),
        }
    }

    fn into_failure(self) -> Failure {
        Failure {
            at: self.furthest,
            expected: self.expected,
        }
    }

    fn record(&mut self, pos: usize, expected: &str) {
        if pos > self.furthest {
            self.furthest = pos;
            self.expected.clear();
        }
        if pos == self.furthest {
            self.expected.insert(expected.to_string());
        }
    }

    fn parse_rule(&mut self, name: &str, pos: usize, depth: usize) -> Option<(ParseNode, usize)> {
        if depth > MAX_DEPTH {
            self.record(pos, "recursion limit");
            return None;
        }
        let rules = self.rules;
        let expr = rules.get(name)?;
        let mut children = Vec::new();
        let next = self.parse_expr(expr, pos, depth, &mut children)?;
        Some((
            ParseNode {
                rule: name.to_string(),
                children,
            },
            next,
        ))
    }

    fn parse_expr(
        &mut self,
        expr: &'g Expr,
        pos: usize,
        depth: usize,
        out: &mut Vec<Child>,
    ) -> Option<usize> {
        match expr {
            Expr::RuleRef(name) => {
                let (node, next) = self.parse_rule(name, pos, depth + 1)?;
                out.push(Child::Node(node));
                Some(next)
            }
            Expr::TermRef(name) => match self.toks.get(pos) {
                Some(tok) if tok.term.is_named(name) => {
                    out.push(Child::Token(tok.clone()));
                    Some(pos + 1)
                }
                _ => {
                    self.record(pos, name);
                    None
                }
            },
            Expr::Literal(text) => match self.toks.get(pos) {
                Some(tok) if tok.term.is_anon(text) => {
                    out.push(Child::Token(tok.clone()));
                    Some(pos + 1)
                }
                _ => {
                    self.record(pos, &format!("{:?}", text));
                    None
                }
            },
            Expr::Seq(items) => {
                let mut pos = pos;
                for item in items {
                    pos = self.parse_expr(item, pos, depth, out)?;
                }
                Some(pos)
            }
            Expr::Alt(branches) => {
                let mark = out.len();
                for branch in branches {
                    if let Some(next) = self.parse_expr(branch, pos, depth, out) {
                        return Some(next);
                    }
                    out.truncate(mark);
                }
                None
            }
            Expr::Opt(inner) => {
                let mark = out.len();
                match self.parse_expr(inner, pos, depth, out) {
                    Some(next) => Some(next),
                    None => {
                        out.truncate(mark);
                        Some(pos)
                    }
                }
            }
            Expr::Star(inner) => {
                let mut pos = pos;
                loop {
                    let mark = out.len();
                    match self.parse_expr(inner, pos, depth, out) {
                        // Empty matches make no progress; stop.
                        Some(next) if next > pos => pos = next,
                        _ => {
                            out.truncate(mark);
                            break;
                        }
                    }
                }
                Some(pos)
            }
            Expr::Plus(inner) => {
                let mut pos = self.parse_expr(inner, pos, depth, out)?;
                loop {
                    let mark = out.len();
                    match self.parse_expr(inner, pos, depth, out) {
                        Some(next) if next > pos => pos = next,
                        _ => {
                            out.truncate(mark);
                            break;
                        }
                    }
                }
                Some(pos)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chant::backend::descent::lexer::TermId;
    use crate::chant::backend::meta::parse_definition;

    fn tok(term: TermId, text: &str, at: usize) -> Tok {
        Tok {
            term,
            text: text.to_string(),
            span: at..at + text.len(),
        }
    }

    fn ident(text: &str, at: usize) -> Tok {
        tok(TermId::Named("IDENTIFIER".into()), text, at)
    }

    fn anon(text: &str, at: usize) -> Tok {
        tok(TermId::Anon(text.into()), text, at)
    }

    fn rules(defs: &[(&str, &str)]) -> HashMap<String, Expr> {
        defs.iter()
            .map(|(name, def)| ((*name).to_string(), parse_definition(name, def).unwrap()))
            .collect()
    }

    #[test]
    fn test_parses_simple_call() {
        let rules = rules(&[("call", "IDENTIFIER \"(\" \")\"")]);
        let toks = vec![ident("go", 0), anon("(", 2), anon(")", 3)];
        let node = Engine::run(&rules, "call", &toks).unwrap();
        assert_eq!(node.rule, "call");
        assert_eq!(node.children.len(), 3);
    }

    #[test]
    fn test_ordered_alternation_backtracks() {
        // First branch consumes IDENTIFIER then needs "=", second accepts a
        // bare IDENTIFIER; the engine must back out of the first.
        let rules = rules(&[("arg", "IDENTIFIER \"=\" IDENTIFIER | IDENTIFIER")]);
        let toks = vec![ident("x", 0)];
        let node = Engine::run(&rules, "arg", &toks).unwrap();
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn test_star_repetition() {
        let rules = rules(&[("chain", "IDENTIFIER (\",\" IDENTIFIER)*")]);
        let toks = vec![
            ident("a", 0),
            anon(",", 1),
            ident("b", 2),
            anon(",", 3),
            ident("c", 4),
        ];
        let node = Engine::run(&rules, "chain", &toks).unwrap();
        assert_eq!(node.children.len(), 5);
    }

    #[test]
    fn test_trailing_input_rejected() {
        let rules = rules(&[("one", "IDENTIFIER")]);
        let toks = vec![ident("a", 0), ident("b", 2)];
        let failure = Engine::run(&rules, "one", &toks).unwrap_err();
        assert_eq!(failure.at, 1);
        assert!(failure.expected.contains("end of input"));
    }

    #[test]
    fn test_failure_reports_furthest_position() {
        // call: IDENTIFIER "(" ")" against `go (` fails at index 2 wanting ")".
        let rules = rules(&[("call", "IDENTIFIER \"(\" \")\"")]);
        let toks = vec![ident("go", 0), anon("(", 2)];
        let failure = Engine::run(&rules, "call", &toks).unwrap_err();
        assert_eq!(failure.at, 2);
        assert!(failure.expected.contains("\")\""));
    }

    #[test]
    fn test_nested_rules() {
        let rules = rules(&[
            ("pair", "key \"=\" key"),
            ("key", "IDENTIFIER"),
        ]);
        let toks = vec![ident("a", 0), anon("=", 1), ident("b", 2)];
        let node = Engine::run(&rules, "pair", &toks).unwrap();
        let rule_children: Vec<_> = node
            .children
            .iter()
            .filter_map(|c| match c {
                Child::Node(n) => Some(n.rule.as_str()),
                Child::Token(_) => None,
            })
            .collect();
        assert_eq!(rule_children, ["key", "key"]);
    }
}
