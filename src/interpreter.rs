// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod document;
pub mod error;
pub mod refs;
pub mod unify;

use crate::ast::*;
use crate::bindings::Bindings;
use crate::interpreter::error::EvalError;
use crate::interpreter::refs::eval_ref;
use crate::interpreter::unify::unify;
use crate::store::Store;
use crate::term::Term;
use crate::value::Value;

use anyhow::Result;
use log::{debug, trace};
use serde::Serialize;

/// State of one evaluation: the rule being evaluated (none for ad-hoc
/// queries), the bindings of the current branch, and the store.
///
/// A context is never mutated. Each branch extends it into a new context
/// with [`Context::with_bindings`], so siblings never see each other's
/// bindings.
#[derive(Clone)]
pub struct Context<'a> {
    pub rule: Option<&'a Rule>,
    pub bindings: Bindings,
    pub store: &'a dyn Store,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            rule: None,
            bindings: Bindings::new(),
            store,
        }
    }

    pub fn with_rule(mut self, rule: &'a Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn with_bindings(&self, bindings: Bindings) -> Context<'a> {
        Context {
            rule: self.rule,
            bindings,
            store: self.store,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub bindings: Value,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResults {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<QueryResult>,
}

/// Evaluates the body of the context's rule.
///
/// `k` is invoked once per solution of the whole body. Returning an error
/// from `k` stops the search and the error is returned from here unchanged.
/// A context without a rule has an empty body and a single solution.
pub fn eval_terms<'a>(
    ctx: &Context<'a>,
    k: &mut dyn FnMut(&Context<'a>) -> Result<()>,
) -> Result<()> {
    match ctx.rule {
        Some(rule) => eval_body(ctx, &rule.body, k),
        None => k(ctx),
    }
}

/// Evaluates an ad-hoc conjunction of expressions.
pub fn eval_query<'a>(
    ctx: &Context<'a>,
    body: &[Expr],
    k: &mut dyn FnMut(&Context<'a>) -> Result<()>,
) -> Result<()> {
    eval_body(ctx, body, k)
}

fn eval_body<'a>(
    ctx: &Context<'a>,
    body: &[Expr],
    k: &mut dyn FnMut(&Context<'a>) -> Result<()>,
) -> Result<()> {
    let (expr, rest) = match body.split_first() {
        Some(split) => split,
        None => {
            trace!("body satisfied with {:?}", ctx.bindings);
            return k(ctx);
        }
    };

    debug!("eval: {expr}");
    match expr {
        Expr::Eq(a, b) => eval_eq(ctx, a, b, rest, k),
        Expr::Term(t) => eval_bare_term(ctx, t, rest, k),
    }
}

fn eval_eq<'a>(
    ctx: &Context<'a>,
    a: &Term,
    b: &Term,
    rest: &[Expr],
    k: &mut dyn FnMut(&Context<'a>) -> Result<()>,
) -> Result<()> {
    let a = ctx.bindings.plug(a);
    resolve_refs(ctx, &a, &mut |ctx, a| {
        // Resolving `a` may have bound variables that occur in `b`.
        let b = ctx.bindings.plug(b);
        resolve_refs(ctx, &b, &mut |ctx, b| match unify(&a, &b, &ctx.bindings)? {
            Some(bindings) => eval_body(&ctx.with_bindings(bindings), rest, &mut *k),
            None => Ok(()),
        })
    })
}

fn eval_bare_term<'a>(
    ctx: &Context<'a>,
    term: &Term,
    rest: &[Expr],
    k: &mut dyn FnMut(&Context<'a>) -> Result<()>,
) -> Result<()> {
    let term = ctx.bindings.plug(term);
    if let Term::Var(v) = &term {
        return Err(EvalError::UnboundVariable(v.clone()).into());
    }

    resolve_refs(ctx, &term, &mut |ctx, value| match value {
        Term::Bool(false) => Ok(()),
        _ => eval_body(ctx, rest, &mut *k),
    })
}

/// Replaces every reference inside `term` by the values it resolves to.
///
/// References are expanded left to right and `k` is invoked once for every
/// combination of their solutions, with the bindings the expansion made.
/// A term without references is passed through as is.
pub fn resolve_refs<'a>(
    ctx: &Context<'a>,
    term: &Term,
    k: &mut dyn FnMut(&Context<'a>, Term) -> Result<()>,
) -> Result<()> {
    if !term.has_refs() {
        return k(ctx, term.clone());
    }

    match term {
        Term::Ref(r) => eval_ref(ctx, r, &mut |ctx, value| k(ctx, Term::from(value))),
        Term::Array(items) => {
            let mut done = Vec::with_capacity(items.len());
            resolve_seq(ctx, items, &mut done, &mut |ctx, items| {
                k(ctx, Term::array(items))
            })
        }
        Term::Object(fields) => {
            let flat: Vec<Term> = fields
                .iter()
                .flat_map(|(key, value)| [key.clone(), value.clone()])
                .collect();
            let mut done = Vec::with_capacity(flat.len());
            resolve_seq(ctx, &flat, &mut done, &mut |ctx, flat| {
                let mut fields = Vec::with_capacity(flat.len() / 2);
                let mut iter = flat.into_iter();
                while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
                    fields.push((key, value));
                }
                k(ctx, Term::object(fields))
            })
        }
        _ => k(ctx, term.clone()),
    }
}

fn resolve_seq<'a>(
    ctx: &Context<'a>,
    items: &[Term],
    done: &mut Vec<Term>,
    k: &mut dyn FnMut(&Context<'a>, Vec<Term>) -> Result<()>,
) -> Result<()> {
    let (first, rest) = match items.split_first() {
        Some(split) => split,
        None => return k(ctx, done.clone()),
    };

    // Earlier items may have bound variables used by this one.
    let first = ctx.bindings.plug(first);
    resolve_refs(ctx, &first, &mut |ctx, item| {
        done.push(item);
        let r = resolve_seq(ctx, rest, &mut *done, &mut *k);
        done.pop();
        r
    })
}
