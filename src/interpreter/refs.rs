// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::interpreter::unify::unify;
use crate::interpreter::{resolve_refs, Context};
use crate::term::{Reference, Term};
use crate::value::Value;

use anyhow::Result;
use log::trace;

/// Enumerates every store path matched by `reference`.
///
/// Ground segments descend directly. A variable segment is bound, in turn, to
/// each key of the node reached so far. `k` is invoked once per complete
/// path with the bindings made along it and the value found there. Missing
/// keys and out-of-range indices end a path silently.
pub fn eval_ref<'a>(
    ctx: &Context<'a>,
    reference: &Reference,
    k: &mut dyn FnMut(&Context<'a>, &Value) -> Result<()>,
) -> Result<()> {
    let mut path = vec![Value::from(reference.base.name())];
    walk(ctx, &mut path, &reference.path, k)
}

fn walk<'a>(
    ctx: &Context<'a>,
    path: &mut Vec<Value>,
    segments: &[Term],
    k: &mut dyn FnMut(&Context<'a>, &Value) -> Result<()>,
) -> Result<()> {
    let (segment, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            return match ctx.store.get(path) {
                Some(value) => {
                    trace!("ref leaf {path:?} = {value}");
                    k(ctx, &value)
                }
                None => Ok(()),
            };
        }
    };

    let segment = ctx.bindings.plug(segment);
    if segment.has_refs() {
        // Nested reference, e.g. a[b[0]]: resolve it to a key first.
        return resolve_refs(ctx, &segment, &mut |ctx, segment| {
            walk_segment(ctx, &mut *path, &segment, rest, &mut *k)
        });
    }
    walk_segment(ctx, path, &segment, rest, k)
}

fn walk_segment<'a>(
    ctx: &Context<'a>,
    path: &mut Vec<Value>,
    segment: &Term,
    rest: &[Term],
    k: &mut dyn FnMut(&Context<'a>, &Value) -> Result<()>,
) -> Result<()> {
    if let Some(key) = segment.to_value() {
        path.push(key);
        let r = walk(ctx, path, rest, k);
        path.pop();
        return r;
    }

    let node = match ctx.store.get(path) {
        Some(node) => node,
        None => return Ok(()),
    };

    for (key, _) in node.entries() {
        let bindings = match segment {
            Term::Var(v) => ctx.bindings.bind(v.clone(), Term::from(&key)),
            // A partially bound composite key is matched against each key.
            _ => match unify(segment, &Term::from(&key), &ctx.bindings)? {
                Some(bindings) => bindings,
                None => continue,
            },
        };
        path.push(key);
        let r = walk(&ctx.with_bindings(bindings), path, rest, k);
        path.pop();
        r?;
    }
    Ok(())
}
