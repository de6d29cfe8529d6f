//! Recursive descent backend
//!
//!     The built-in backend. Compilation parses every rule definition into
//!     an expression tree, interprets the backend's own directives
//!     (`%import common.*`, `%ignore`), validates the grammar (references,
//!     terminal patterns, left recursion, canonical rule names), and builds
//!     the runtime lexer. The result is an immutable [CompiledParser] that
//!     interprets the grammar data on every `parse` call.

pub mod engine;
pub mod lexer;
pub mod lower;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::expr::Expr;
use super::{meta, render, Backend, GrammarError, GrammarInput, Parser, SyntaxError};
use crate::chant::ast::Program;
use crate::chant::grammar::{GrammarSpec, Terminal};
use engine::{Engine, Failure};
use lexer::{CompiledLexer, LexRule, TermId, Tok};

/// Terminal classes provided by `%import common.<NAME>`.
const BUILTIN_CLASSES: &[(&str, &str)] = &[
    ("WS", r"[ \t\f\r\n]+"),
    ("WS_INLINE", r"[ \t\f]+"),
    ("NEWLINE", r"(\r?\n)+"),
];

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%import\s+common\.([A-Za-z_][A-Za-z0-9_]*)\s*$").unwrap());
static IGNORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%ignore\s+([A-Za-z_][A-Za-z0-9_]*)\s*$").unwrap());

/// The built-in descent backend. Stateless; one instance compiles any
/// number of grammars.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescentBackend;

impl DescentBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for DescentBackend {
    fn compile(&self, input: GrammarInput<'_>) -> Result<Box<dyn Parser>, GrammarError> {
        let parser = match input {
            GrammarInput::Spec(spec) => CompiledParser::compile(spec, None)?,
            GrammarInput::Text(text) => {
                let spec = meta::parse_grammar_text(text)?;
                // Keep the hand-authored text verbatim for export.
                CompiledParser::compile(&spec, Some(text.to_string()))?
            }
        };
        Ok(Box::new(parser))
    }

    fn render(&self, spec: &GrammarSpec) -> String {
        render::render(spec)
    }

    fn clean_for_external_grammar(&self, grammar_text: &str) -> String {
        render::clean_for_external_grammar(grammar_text)
    }
}

/// A grammar compiled for the descent engine.
pub struct CompiledParser {
    start: String,
    rules: HashMap<String, Expr>,
    lexer: CompiledLexer,
    grammar_text: String,
}

impl CompiledParser {
    fn compile(spec: &GrammarSpec, text: Option<String>) -> Result<Self, GrammarError> {
        let grammar_text = text.unwrap_or_else(|| render::render(spec));

        let mut rules = HashMap::new();
        for rule in spec.rules() {
            let expr = meta::parse_definition(&rule.name, &rule.definition)?;
            rules.insert(rule.name.clone(), expr);
        }

        let (terminals, ignore) = apply_directives(spec)?;

        // Literals in rule definitions alias a named terminal with the same
        // literal pattern; the rest become anonymous terminals.
        let literal_names: HashMap<&str, &str> = {
            let mut map = HashMap::new();
            for term in &terminals {
                if !term.is_regex() {
                    map.entry(term.pattern.as_str()).or_insert(term.name.as_str());
                }
            }
            map
        };
        let mut anon_literals: Vec<String> = Vec::new();
        for expr in rules.values_mut() {
            normalize_literals(expr, &literal_names, &mut anon_literals);
        }

        check_references(&rules, &terminals)?;
        check_left_recursion(&rules)?;
        for canonical in ["call_chain", "call"] {
            if !rules.contains_key(canonical) {
                return Err(GrammarError::MissingCanonicalRule {
                    rule: canonical.to_string(),
                });
            }
        }

        let lexer = build_lexer(&terminals, &anon_literals, ignore)?;

        Ok(Self {
            start: spec.start().to_string(),
            rules,
            lexer,
            grammar_text,
        })
    }
}

impl Parser for CompiledParser {
    fn parse(&self, source: &str) -> Result<Program, SyntaxError> {
        let toks = self.lexer.tokenize(source)?;
        let root = Engine::run(&self.rules, &self.start, &toks)
            .map_err(|failure| syntax_error(source, &toks, failure))?;
        lower::lower(&root, source)
    }

    fn grammar_text(&self) -> &str {
        &self.grammar_text
    }
}

/// Resolve `%import common.*` and `%ignore` into the effective terminal set
/// and ignore set. Other directives pass through with no compile-time
/// effect.
fn apply_directives(spec: &GrammarSpec) -> Result<(Vec<Terminal>, HashSet<String>), GrammarError> {
    let mut terminals = spec.terminals().to_vec();
    let mut ignore = HashSet::new();
    for directive in spec.directives() {
        let line = directive.as_str().trim();
        if let Some(caps) = IMPORT_RE.captures(line) {
            let name = &caps[1];
            let class = BUILTIN_CLASSES
                .iter()
                .find(|(class_name, _)| *class_name == name)
                .ok_or_else(|| GrammarError::UnknownImport {
                    name: name.to_string(),
                })?;
            // An explicit terminal with the same name wins over the import.
            if !terminals.iter().any(|t| t.name == name) {
                terminals.push(Terminal::new(name, format!("/{}/", class.1), ""));
            }
        } else if let Some(caps) = IGNORE_RE.captures(line) {
            ignore.insert(caps[1].to_string());
        }
    }
    for name in &ignore {
        if !terminals.iter().any(|t| &t.name == name) {
            return Err(GrammarError::UnknownIgnore { name: name.clone() });
        }
    }
    Ok((terminals, ignore))
}

/// Replace literals that alias a named terminal; collect the rest in
/// first-use order.
fn normalize_literals(
    expr: &mut Expr,
    literal_names: &HashMap<&str, &str>,
    anons: &mut Vec<String>,
) {
    match expr {
        Expr::Literal(text) => {
            if let Some(name) = literal_names.get(text.as_str()) {
                *expr = Expr::TermRef((*name).to_string());
            } else if !anons.contains(text) {
                anons.push(text.clone());
            }
        }
        Expr::Seq(items) | Expr::Alt(items) => {
            for item in items {
                normalize_literals(item, literal_names, anons);
            }
        }
        Expr::Opt(inner) | Expr::Star(inner) | Expr::Plus(inner) => {
            normalize_literals(inner, literal_names, anons);
        }
        Expr::RuleRef(_) | Expr::TermRef(_) => {}
    }
}

fn check_references(
    rules: &HashMap<String, Expr>,
    terminals: &[Terminal],
) -> Result<(), GrammarError> {
    for (name, expr) in rules {
        let mut result = Ok(());
        walk_atoms(expr, &mut |atom| {
            if result.is_err() {
                return;
            }
            match atom {
                Expr::RuleRef(referenced) if !rules.contains_key(referenced) => {
                    result = Err(GrammarError::UnknownReference {
                        rule: name.clone(),
                        name: referenced.clone(),
                    });
                }
                Expr::TermRef(referenced)
                    if !terminals.iter().any(|t| &t.name == referenced) =>
                {
                    result = Err(GrammarError::UnknownReference {
                        rule: name.clone(),
                        name: referenced.clone(),
                    });
                }
                _ => {}
            }
        });
        result?;
    }
    Ok(())
}

fn walk_atoms(expr: &Expr, visit: &mut impl FnMut(&Expr)) {
    match expr {
        Expr::Seq(items) | Expr::Alt(items) => {
            for item in items {
                walk_atoms(item, visit);
            }
        }
        Expr::Opt(inner) | Expr::Star(inner) | Expr::Plus(inner) => walk_atoms(inner, visit),
        atom => visit(atom),
    }
}

/// Reject rules the descent engine would loop on: a rule whose leftmost
/// derivation can reach itself again without consuming a token.
fn check_left_recursion(rules: &HashMap<String, Expr>) -> Result<(), GrammarError> {
    let leads: HashMap<&str, Vec<&str>> = rules
        .iter()
        .map(|(name, expr)| {
            let lead_rules: Vec<&str> = expr
                .leading_atoms()
                .into_iter()
                .filter_map(|atom| match atom {
                    Expr::RuleRef(n) => Some(n.as_str()),
                    _ => None,
                })
                .collect();
            (name.as_str(), lead_rules)
        })
        .collect();

    for origin in rules.keys() {
        let mut visited = HashSet::new();
        let mut stack: Vec<&str> = leads.get(origin.as_str()).cloned().unwrap_or_default();
        while let Some(current) = stack.pop() {
            if current == origin {
                return Err(GrammarError::LeftRecursive {
                    rule: origin.clone(),
                });
            }
            if visited.insert(current) {
                if let Some(next) = leads.get(current) {
                    stack.extend(next.iter().copied());
                }
            }
        }
    }
    Ok(())
}

fn build_lexer(
    terminals: &[Terminal],
    anon_literals: &[String],
    ignore: HashSet<String>,
) -> Result<CompiledLexer, GrammarError> {
    let mut rules = Vec::new();
    for term in terminals {
        let id = TermId::Named(term.name.clone());
        if term.is_regex() {
            let anchored = format!(r"\A(?:{})", term.pattern_body());
            let regex = Regex::new(&anchored).map_err(|e| GrammarError::BadTerminalPattern {
                terminal: term.name.clone(),
                message: e.to_string(),
            })?;
            rules.push(LexRule::pattern(id, regex));
        } else {
            rules.push(LexRule::literal(id, term.pattern.clone()));
        }
    }
    for literal in anon_literals {
        rules.push(LexRule::literal(TermId::Anon(literal.clone()), literal.clone()));
    }
    Ok(CompiledLexer::new(rules, ignore))
}

fn syntax_error(source: &str, toks: &[Tok], failure: Failure) -> SyntaxError {
    let (offset, found, message) = match toks.get(failure.at) {
        Some(tok) => (
            tok.span.start,
            Some(format!("{:?}", tok.text)),
            "unexpected token".to_string(),
        ),
        None => (source.len(), None, "unexpected end of input".to_string()),
    };
    let mut err = SyntaxError::new(source, offset, message);
    err.expected = failure.expected.into_iter().collect();
    err.found = found;
    err
}
