// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Rule, RuleHead};
use crate::bindings::Bindings;
use crate::interpreter::error::EvalError;
use crate::interpreter::{eval_terms, resolve_refs, Context};
use crate::store::Store;
use crate::term::Term;
use crate::value::Value;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use log::debug;

/// Knobs for document assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalOptions {
    /// Reject complete rules whose solutions disagree on the value, and
    /// partial-object rules that produce two values for one key. When off,
    /// the first value of a complete rule wins and object keys are
    /// overwritten in solution order.
    pub strict: bool,
}

/// Evaluates `rule` and assembles its document.
///
/// Returns [`Value::Undefined`] for a complete rule without solutions. Set
/// and object rules without solutions produce an empty array or object.
pub fn evaluate(rule: &Rule, bindings: &Bindings, store: &dyn Store) -> Result<Value> {
    evaluate_with(rule, bindings, store, &EvalOptions::default())
}

pub fn evaluate_with(
    rule: &Rule,
    bindings: &Bindings,
    store: &dyn Store,
    options: &EvalOptions,
) -> Result<Value> {
    debug!("evaluating rule {}", rule.name);
    let ctx = Context::new(store)
        .with_rule(rule)
        .with_bindings(bindings.clone());

    match &rule.head {
        RuleHead::Scalar { value } => {
            let mut result = Value::Undefined;
            eval_terms(&ctx, &mut |ctx| {
                head_values(ctx, value, &mut |v| {
                    if result.is_undefined() {
                        result = v;
                    } else if options.strict && result != v {
                        return Err(EvalError::ConflictingValues(result.clone(), v).into());
                    }
                    Ok(())
                })
            })?;
            Ok(result)
        }

        RuleHead::Set { key } => {
            let mut set = BTreeSet::new();
            eval_terms(&ctx, &mut |ctx| {
                head_values(ctx, key, &mut |v| {
                    set.insert(v);
                    Ok(())
                })
            })?;
            Ok(Value::from(set.into_iter().collect::<Vec<_>>()))
        }

        RuleHead::Object { key, value } => {
            let mut object = BTreeMap::new();
            eval_terms(&ctx, &mut |ctx| {
                head_values(ctx, key, &mut |k| {
                    if !matches!(k, Value::String(_)) {
                        return Err(EvalError::NonStringObjectKey(k).into());
                    }
                    head_values(ctx, value, &mut |v| {
                        match object.insert(k.clone(), v.clone()) {
                            Some(prev) if options.strict && prev != v => {
                                Err(EvalError::ConflictingObjectKey {
                                    key: k.clone(),
                                    first: prev,
                                    second: v,
                                }
                                .into())
                            }
                            _ => Ok(()),
                        }
                    })
                })
            })?;
            Ok(Value::from(object))
        }
    }
}

// Plugs a head term, expands any references in it and emits each resulting
// ground value.
fn head_values<'a>(
    ctx: &Context<'a>,
    head: &Term,
    emit: &mut dyn FnMut(Value) -> Result<()>,
) -> Result<()> {
    let head = ctx.bindings.plug(head);
    resolve_refs(ctx, &head, &mut |ctx, term| {
        let term = ctx.bindings.plug(&term);
        match term.to_value() {
            Some(v) => emit(v),
            None => Err(EvalError::NonGroundValue(term).into()),
        }
    })
}
