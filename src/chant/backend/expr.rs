//! Grammar expression tree
//!
//!     The parsed form of one rule definition: sequences, ordered
//!     alternation, repetition suffixes, grouping, and three kinds of atoms
//!     (rule references, TERMINAL references, quoted literals). The descent
//!     engine interprets this tree directly; nothing is code-generated.

use std::fmt;

/// One grammar expression. Alternation is ordered: the engine tries
/// alternatives in declaration order and commits to the first that matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Reference to a production rule (lowercase name).
    RuleRef(String),
    /// Reference to a named terminal (UPPERCASE name).
    TermRef(String),
    /// An anonymous quoted literal, e.g. `"("`.
    Literal(String),
    /// Items matched one after another.
    Seq(Vec<Expr>),
    /// Ordered choice between alternatives.
    Alt(Vec<Expr>),
    /// Zero or one.
    Opt(Box<Expr>),
    /// Zero or more.
    Star(Box<Expr>),
    /// One or more.
    Plus(Box<Expr>),
}

impl Expr {
    /// True when this expression can match the empty token sequence.
    pub fn is_nullable(&self) -> bool {
        match self {
            Expr::Opt(_) | Expr::Star(_) => true,
            Expr::Plus(inner) => inner.is_nullable(),
            Expr::Seq(items) => items.iter().all(|i| i.is_nullable()),
            Expr::Alt(branches) => branches.iter().any(|b| b.is_nullable()),
            Expr::RuleRef(_) | Expr::TermRef(_) | Expr::Literal(_) => false,
        }
    }

    /// The leftmost atoms this expression can begin with, used by the
    /// left-recursion check. In a sequence, items past a nullable prefix
    /// also contribute; in an alternation, every branch contributes.
    pub fn leading_atoms(&self) -> Vec<&Expr> {
        match self {
            Expr::Seq(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(item.leading_atoms());
                    if !item.is_nullable() {
                        break;
                    }
                }
                out
            }
            Expr::Alt(branches) => branches.iter().flat_map(|b| b.leading_atoms()).collect(),
            Expr::Opt(inner) | Expr::Star(inner) | Expr::Plus(inner) => inner.leading_atoms(),
            atom => vec![atom],
        }
    }
}

fn needs_group(expr: &Expr) -> bool {
    matches!(expr, Expr::Seq(_) | Expr::Alt(_))
}

fn fmt_postfix(inner: &Expr, suffix: char, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if needs_group(inner) {
        write!(f, "({}){}", inner, suffix)
    } else {
        write!(f, "{}{}", inner, suffix)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::RuleRef(name) | Expr::TermRef(name) => write!(f, "{}", name),
            Expr::Literal(text) => write!(f, "{:?}", text),
            Expr::Seq(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    if matches!(item, Expr::Alt(_)) {
                        write!(f, "({})", item)?;
                    } else {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Expr::Alt(branches) => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", branch)?;
                }
                Ok(())
            }
            Expr::Opt(inner) => fmt_postfix(inner, '?', f),
            Expr::Star(inner) => fmt_postfix(inner, '*', f),
            Expr::Plus(inner) => fmt_postfix(inner, '+', f),
        }
    }
}
