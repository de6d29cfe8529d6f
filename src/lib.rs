//! # chant
//!
//! A grammar-driven call-chain DSL engine: a host application registers
//! verbs, picks (or declares) a concrete grammar, and hands the engine
//! source text; the engine parses it, binds arguments, and dispatches each
//! call in order to the registered handlers.
//!
//! The pipeline is grammar-definition → parse → interpret → execute:
//!
//! - a grammar is data ([GrammarSpec](chant::grammar::GrammarSpec)),
//!   authored via [GrammarBuilder](chant::grammar::GrammarBuilder), a
//!   structured document, or raw grammar text;
//! - a [Backend](chant::backend::Backend) compiles it into a reusable
//!   parser, and can reduce it to a standalone CFG for constraining an
//!   external generator;
//! - parsed programs resolve against a [VerbRegistry](chant::verbs::VerbRegistry)
//!   and execute through the [Dsl](chant::runtime::Dsl) facade.
//!
//! ## Testing
//!
//! Parser tests assert AST shape and content with the fluent helpers in the
//! [testing module](chant::testing), not node counts.

pub mod chant;
