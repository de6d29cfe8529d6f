//! Grammar text front end
//!
//!     Tokenizes grammar text with logos and parses it with chumsky into a
//!     [GrammarSpec], mirroring the lexer/parser split used for the DSL
//!     itself. The same expression parser also handles individual rule
//!     definitions coming from builders and config documents, so every
//!     authoring path shares one notion of what a definition means.
//!
//! Grammar text is line-oriented:
//!
//!     start: call_chain
//!     call_chain: call (DOT call)*
//!     DOT: "."
//!     NUMBER: /-?\d+(\.\d+)?/
//!     %import common.WS
//!     %ignore WS
//!
//! Lowercase names declare rules, UPPERCASE names declare terminals, and
//! `%` lines are directives. `//` comments run to end of line.

use chumsky::prelude::*;
use logos::Logos;
use std::ops::Range;

use super::expr::Expr;
use super::GrammarError;
use crate::chant::ast::unescape;
use crate::chant::grammar::{Directive, GrammarSpec, Rule, Terminal};

/// Tokens of the grammar notation itself.
#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"//[^\n]*")]
pub enum MetaTok {
    #[regex(r"%[^\n]*", |lex| lex.slice().trim_end().to_string())]
    DirectiveLine(String),

    #[regex(r"[a-z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    RuleName(String),

    #[regex(r"[A-Z][A-Z0-9_]*", |lex| lex.slice().to_string())]
    TerminalName(String),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice().to_string())]
    StringLit(String),

    #[regex(r"/([^/\\\n]|\\.)+/", |lex| lex.slice().to_string())]
    RegexLit(String),

    #[token(":")]
    Colon,
    #[token("|")]
    Pipe,
    #[token("?")]
    Question,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("\n")]
    Newline,
}

/// Token with its byte range in the grammar text.
pub type TokLoc = (MetaTok, Range<usize>);

type PErr = Simple<TokLoc>;

/// Tokenize grammar text, failing on characters the notation does not know.
pub fn tokenize(text: &str) -> Result<Vec<TokLoc>, GrammarError> {
    let mut lexer = MetaTok::lexer(text);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(tok) => tokens.push((tok, lexer.span())),
            Err(()) => {
                return Err(GrammarError::MetaSyntax {
                    offset: lexer.span().start,
                    message: format!("unexpected character {:?}", lexer.slice()),
                })
            }
        }
    }
    Ok(tokens)
}

/// Match a specific token, ignoring its location.
fn tok(t: MetaTok) -> impl Parser<TokLoc, (), Error = PErr> + Clone {
    filter(move |(tk, _): &TokLoc| *tk == t).ignored()
}

fn rule_name() -> impl Parser<TokLoc, String, Error = PErr> + Clone {
    filter_map(|span, (tk, _): TokLoc| match tk {
        MetaTok::RuleName(name) => Ok(name),
        _ => Err(Simple::custom(span, "expected rule name")),
    })
}

fn terminal_name() -> impl Parser<TokLoc, String, Error = PErr> + Clone {
    filter_map(|span, (tk, _): TokLoc| match tk {
        MetaTok::TerminalName(name) => Ok(name),
        _ => Err(Simple::custom(span, "expected terminal name")),
    })
}

fn string_lit() -> impl Parser<TokLoc, String, Error = PErr> + Clone {
    filter_map(|span, (tk, _): TokLoc| match tk {
        MetaTok::StringLit(text) => Ok(unquote(&text)),
        _ => Err(Simple::custom(span, "expected string literal")),
    })
}

/// Strip the surrounding quotes and decode escapes.
fn unquote(quoted: &str) -> String {
    unescape(&quoted[1..quoted.len() - 1])
}

/// Parser for one grammar expression (a rule definition body).
pub fn expr_parser() -> impl Parser<TokLoc, Expr, Error = PErr> + Clone {
    recursive(|expr| {
        let atom = choice((
            rule_name().map(Expr::RuleRef),
            terminal_name().map(Expr::TermRef),
            string_lit().map(Expr::Literal),
            expr.delimited_by(tok(MetaTok::LParen), tok(MetaTok::RParen)),
        ));

        let suffix = choice((
            tok(MetaTok::Question).to('?'),
            tok(MetaTok::Star).to('*'),
            tok(MetaTok::Plus).to('+'),
        ))
        .or_not();

        let postfix = atom.then(suffix).map(|(inner, op)| match op {
            Some('?') => Expr::Opt(Box::new(inner)),
            Some('*') => Expr::Star(Box::new(inner)),
            Some('+') => Expr::Plus(Box::new(inner)),
            _ => inner,
        });

        let seq = postfix.repeated().at_least(1).map(|mut items: Vec<Expr>| {
            if items.len() == 1 {
                items.remove(0)
            } else {
                Expr::Seq(items)
            }
        });

        seq.separated_by(tok(MetaTok::Pipe))
            .at_least(1)
            .map(|mut branches: Vec<Expr>| {
                if branches.len() == 1 {
                    branches.remove(0)
                } else {
                    Expr::Alt(branches)
                }
            })
    })
}

enum Item {
    Rule(Rule),
    Terminal(Terminal),
    Directive(Directive),
}

fn item_parser() -> impl Parser<TokLoc, Item, Error = PErr> + Clone {
    let directive = filter_map(|span, (tk, _): TokLoc| match tk {
        MetaTok::DirectiveLine(text) => Ok(Item::Directive(Directive::new(text))),
        _ => Err(Simple::custom(span, "expected directive")),
    });

    let terminal_pattern = filter_map(|span, (tk, _): TokLoc| match tk {
        MetaTok::StringLit(text) => Ok(unquote(&text)),
        MetaTok::RegexLit(text) => Ok(text),
        _ => Err(Simple::custom(span, "expected terminal pattern")),
    });

    let terminal_def = terminal_name()
        .then_ignore(tok(MetaTok::Colon))
        .then(terminal_pattern)
        .map(|(name, pattern)| Item::Terminal(Terminal::new(name, pattern, "")));

    let rule_def = rule_name()
        .then_ignore(tok(MetaTok::Colon))
        .then(expr_parser())
        .map(|(name, expr)| Item::Rule(Rule::new(name, expr.to_string(), "")));

    choice((directive, terminal_def, rule_def))
}

fn file_parser() -> impl Parser<TokLoc, Vec<Item>, Error = PErr> {
    let blank = tok(MetaTok::Newline).repeated();
    let sep = tok(MetaTok::Newline)
        .repeated()
        .at_least(1)
        .ignored()
        .or(end());
    blank
        .ignore_then(item_parser().then_ignore(sep).repeated())
        .then_ignore(end())
}

/// Parse complete grammar text into a spec.
///
/// The start rule is the rule named `start` when present, otherwise the
/// first declared rule.
pub fn parse_grammar_text(text: &str) -> Result<GrammarSpec, GrammarError> {
    let tokens = tokenize(text)?;
    let items = file_parser()
        .parse(tokens.clone())
        .map_err(|errors| meta_error(text, &tokens, errors))?;

    let mut rules = Vec::new();
    let mut terminals = Vec::new();
    let mut directives = Vec::new();
    for item in items {
        match item {
            Item::Rule(rule) => rules.push(rule),
            Item::Terminal(term) => terminals.push(term),
            Item::Directive(dir) => directives.push(dir),
        }
    }

    let start = if rules.iter().any(|r| r.name == "start") {
        "start".to_string()
    } else {
        match rules.first() {
            Some(rule) => rule.name.clone(),
            None => {
                return Err(GrammarError::MetaSyntax {
                    offset: 0,
                    message: "grammar text declares no rules".to_string(),
                })
            }
        }
    };

    GrammarSpec::new(start, rules, terminals, directives).map_err(GrammarError::Definition)
}

/// Parse one rule-definition string into its expression tree.
pub fn parse_definition(rule_name: &str, definition: &str) -> Result<Expr, GrammarError> {
    let tokens = tokenize(definition).map_err(|err| match err {
        GrammarError::MetaSyntax { message, .. } => GrammarError::BadDefinition {
            rule: rule_name.to_string(),
            message,
        },
        other => other,
    })?;
    expr_parser()
        .then_ignore(end())
        .parse(tokens)
        .map_err(|errors| GrammarError::BadDefinition {
            rule: rule_name.to_string(),
            message: errors
                .first()
                .map(describe)
                .unwrap_or_else(|| "invalid definition".to_string()),
        })
}

/// Human-readable description of a meta parse failure.
fn describe(err: &PErr) -> String {
    match err.found() {
        Some((tok, _)) => format!("unexpected {:?}", tok),
        None => "unexpected end of grammar text".to_string(),
    }
}

/// Map chumsky's token-index spans back to byte offsets for reporting.
fn meta_error(text: &str, tokens: &[TokLoc], errors: Vec<PErr>) -> GrammarError {
    let (offset, message) = match errors.first() {
        Some(err) => {
            let idx = err.span().start;
            let offset = tokens
                .get(idx)
                .map(|(_, span)| span.start)
                .unwrap_or(text.len());
            (offset, describe(err))
        }
        None => (0, "invalid grammar text".to_string()),
    };
    GrammarError::MetaSyntax { offset, message }
}
