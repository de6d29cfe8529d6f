//! Parse tree lowering
//!
//!     Turns the generic parse tree into the call-chain AST. Lowering is
//!     keyed by the canonical rule names (`call_chain`, `call`, `args`,
//!     `arg`, `value`), so a custom grammar may reshape the surface syntax
//!     freely as long as it keeps those names for the structures they
//!     produce. Statements are the `call_chain` nodes under the start rule,
//!     in source order.
//!
//! Value conversion
//!
//!     Decided by the matched terminal's name: NUMBER/INT/FLOAT/SIGNED_NUMBER
//!     lower to numbers, STRING/ESCAPED_STRING to unescaped text (surrounding
//!     quotes stripped), anything else to an identifier reference kept
//!     verbatim.

use super::engine::{Child, ParseNode};
use super::lexer::{TermId, Tok};
use crate::chant::ast::{unescape, Arg, Call, CallChain, Program, Value};
use crate::chant::backend::SyntaxError;

const NUMBER_TERMINALS: &[&str] = &["NUMBER", "INT", "FLOAT", "SIGNED_NUMBER"];
const STRING_TERMINALS: &[&str] = &["STRING", "ESCAPED_STRING"];

/// Lower a full parse tree into a program.
pub fn lower(root: &ParseNode, source: &str) -> Result<Program, SyntaxError> {
    let mut statements = Vec::new();
    collect_chains(root, source, &mut statements)?;
    Ok(Program::new(statements))
}

/// Pre-order walk collecting `call_chain` nodes without descending into
/// them (a chain never nests inside another chain).
fn collect_chains(
    node: &ParseNode,
    source: &str,
    out: &mut Vec<CallChain>,
) -> Result<(), SyntaxError> {
    if node.rule == "call_chain" {
        out.push(lower_chain(node, source)?);
        return Ok(());
    }
    for child in &node.children {
        if let Child::Node(inner) = child {
            collect_chains(inner, source, out)?;
        }
    }
    Ok(())
}

fn lower_chain(chain: &ParseNode, source: &str) -> Result<CallChain, SyntaxError> {
    let mut calls = Vec::new();
    collect_rule_nodes(chain, "call", &mut |node| {
        calls.push(lower_call(node, source));
    });
    let calls = calls.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(CallChain::new(calls))
}

fn lower_call(call: &ParseNode, source: &str) -> Result<Call, SyntaxError> {
    let name_tok = call
        .children
        .iter()
        .find_map(|child| match child {
            Child::Token(tok) if matches!(tok.term, TermId::Named(_)) => Some(tok),
            _ => None,
        })
        .ok_or_else(|| {
            SyntaxError::new(source, 0, "call has no name token; check the call rule")
        })?;

    let mut args = Vec::new();
    collect_rule_nodes(call, "arg", &mut |node| {
        args.push(lower_arg(node, source));
    });
    let args = args.into_iter().collect::<Result<Vec<_>, _>>()?;

    Ok(Call::new(name_tok.text.clone(), args).with_span(name_tok.span.clone()))
}

fn lower_arg(arg: &ParseNode, source: &str) -> Result<Arg, SyntaxError> {
    let value_node = arg.children.iter().find_map(|child| match child {
        Child::Node(node) if node.rule == "value" => Some(node),
        _ => None,
    });

    match value_node {
        Some(node) => {
            // A named token alongside the value node is the keyword.
            let keyword = arg.children.iter().find_map(|child| match child {
                Child::Token(tok) if matches!(tok.term, TermId::Named(_)) => {
                    Some(tok.text.clone())
                }
                _ => None,
            });
            let value = lower_value(node, source)?;
            Ok(match keyword {
                Some(name) => Arg::keyword(name, value),
                None => Arg::positional(value),
            })
        }
        // Grammars that inline the value into the arg rule: a lone token.
        None => {
            let tok = first_token(arg).ok_or_else(|| {
                SyntaxError::new(source, 0, "argument has no value; check the arg rule")
            })?;
            Ok(Arg::positional(convert_value(tok, source)?))
        }
    }
}

fn lower_value(value: &ParseNode, source: &str) -> Result<Value, SyntaxError> {
    let tok = first_token(value).ok_or_else(|| {
        SyntaxError::new(source, 0, "value matched no token; check the value rule")
    })?;
    convert_value(tok, source)
}

fn convert_value(tok: &Tok, source: &str) -> Result<Value, SyntaxError> {
    let name = match &tok.term {
        TermId::Named(name) => name.as_str(),
        TermId::Anon(_) => "",
    };
    if NUMBER_TERMINALS.contains(&name) {
        let number: f64 = tok.text.parse().map_err(|_| {
            SyntaxError::new(
                source,
                tok.span.start,
                format!("{} is not a valid number", tok.text),
            )
        })?;
        return Ok(Value::Number(number));
    }
    if STRING_TERMINALS.contains(&name) {
        let body = tok
            .text
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(&tok.text);
        return Ok(Value::Str(unescape(body)));
    }
    Ok(Value::Ident(tok.text.clone()))
}

/// First token anywhere under the node, in parse order.
fn first_token(node: &ParseNode) -> Option<&Tok> {
    for child in &node.children {
        match child {
            Child::Token(tok) => return Some(tok),
            Child::Node(inner) => {
                if let Some(tok) = first_token(inner) {
                    return Some(tok);
                }
            }
        }
    }
    None
}

/// Walk the tree calling `visit` on each node with the given rule name,
/// without descending into matches.
fn collect_rule_nodes<'a>(
    node: &'a ParseNode,
    rule: &str,
    visit: &mut impl FnMut(&'a ParseNode),
) {
    for child in &node.children {
        if let Child::Node(inner) = child {
            if inner.rule == rule {
                visit(inner);
            } else {
                collect_rule_nodes(inner, rule, visit);
            }
        }
    }
}
