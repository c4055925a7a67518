// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod ast;
mod bindings;
mod engine;
mod interpreter;
mod lexer;
mod number;
mod parser;
mod store;
mod term;
mod value;

// Shared nodes must be Send + Sync so that evaluation errors carrying
// values and terms convert into anyhow::Error.
use std::sync::Arc as Rc;

pub use ast::{Expr, Rule, RuleHead};
pub use bindings::{plug, Bindings};
pub use engine::Engine;
pub use interpreter::document::{evaluate, evaluate_with, EvalOptions};
pub use interpreter::error::EvalError;
pub use interpreter::refs::eval_ref;
pub use interpreter::unify::unify;
pub use interpreter::{eval_query, eval_terms, resolve_refs, Context, QueryResult, QueryResults};
pub use number::Number;
pub use parser::{parse_query, parse_rule, parse_rules, parse_term};
pub use store::{DataStore, Store};
pub use term::{Reference, Term, Var};
pub use value::Value;

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::lexer::*;
    pub use crate::parser::Parser;
}

#[cfg(test)]
mod tests;
