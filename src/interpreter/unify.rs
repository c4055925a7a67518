// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::bindings::Bindings;
use crate::interpreter::error::EvalError;
use crate::term::{Term, Var};

use anyhow::Result;
use log::trace;

/// Unifies `a` with `b` under `bindings`.
///
/// Returns `Ok(None)` when the terms do not match, and the extended
/// environment when they do. Unification is deterministic here, so there is
/// at most one result. The only error is an object pattern keyed by an
/// unbound variable.
pub fn unify(a: &Term, b: &Term, bindings: &Bindings) -> Result<Option<Bindings>> {
    let a = bindings.walk(a);
    let b = bindings.walk(b);

    match (a, b) {
        (Term::Var(x), Term::Var(y)) if x == y => Ok(Some(bindings.clone())),
        (Term::Var(x), other) | (other, Term::Var(x)) => Ok(bind_var(x, other, bindings)),

        (Term::Array(xs), Term::Array(ys)) => {
            if xs.len() != ys.len() {
                return Ok(None);
            }
            let mut bindings = bindings.clone();
            for (x, y) in xs.iter().zip(ys.iter()) {
                match unify(x, y, &bindings)? {
                    Some(b) => bindings = b,
                    None => return Ok(None),
                }
            }
            Ok(Some(bindings))
        }

        (Term::Object(xs), Term::Object(ys)) => unify_objects(xs, ys, bindings),

        // A reference that survived plugging cannot be resolved here.
        (Term::Ref(_), _) | (_, Term::Ref(_)) => Ok(None),

        (Term::Null, Term::Null) => Ok(Some(bindings.clone())),
        (Term::Bool(x), Term::Bool(y)) if x == y => Ok(Some(bindings.clone())),
        (Term::Number(x), Term::Number(y)) if x == y => Ok(Some(bindings.clone())),
        (Term::String(x), Term::String(y)) if x == y => Ok(Some(bindings.clone())),

        _ => {
            trace!("unify: {a} does not match {b}");
            Ok(None)
        }
    }
}

fn bind_var(var: &Var, term: &Term, bindings: &Bindings) -> Option<Bindings> {
    if bindings.plug(term).contains_var(var) {
        trace!("unify: occurs check failed for {var} in {term}");
        return None;
    }
    Some(bindings.bind(var.clone(), term.clone()))
}

fn unify_objects(
    xs: &[(Term, Term)],
    ys: &[(Term, Term)],
    bindings: &Bindings,
) -> Result<Option<Bindings>> {
    let xkeys = plug_keys(xs, bindings)?;
    let ykeys = plug_keys(ys, bindings)?;

    if xkeys.iter().chain(ykeys.iter()).any(Term::has_refs) || xs.len() != ys.len() {
        return Ok(None);
    }

    // Plugging can make two keys of one pattern equal. The key sets then
    // differ even though the lengths agree.
    if has_duplicates(&xkeys) || has_duplicates(&ykeys) {
        return Ok(None);
    }

    let mut bindings = bindings.clone();
    for (xkey, (_, xvalue)) in xkeys.iter().zip(xs.iter()) {
        let yvalue = match ykeys.iter().position(|k| k == xkey) {
            Some(idx) => &ys[idx].1,
            None => return Ok(None),
        };
        match unify(xvalue, yvalue, &bindings)? {
            Some(b) => bindings = b,
            None => return Ok(None),
        }
    }
    Ok(Some(bindings))
}

// Keys are matched by value, so they must be ground once plugged.
fn plug_keys(fields: &[(Term, Term)], bindings: &Bindings) -> Result<Vec<Term>> {
    let mut keys = Vec::with_capacity(fields.len());
    for (key, _) in fields {
        let key = bindings.plug(key);
        if let Some(var) = key.first_var() {
            return Err(EvalError::VariableObjectKey(var.clone()).into());
        }
        keys.push(key);
    }
    Ok(keys)
}

fn has_duplicates(keys: &[Term]) -> bool {
    keys.iter()
        .enumerate()
        .any(|(idx, key)| keys[..idx].contains(key))
}
