// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::term::{Reference, Term, Var};
use crate::value::Value;

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};
use crate::Rc;

struct Binding {
    var: Var,
    term: Term,
    next: Option<Rc<Binding>>,
}

/// An immutable variable-to-term environment.
///
/// Extending an environment produces a new environment that shares its tail
/// with the old one, so every branch of the search keeps its own view.
#[derive(Clone, Default)]
pub struct Bindings {
    head: Option<Rc<Binding>>,
    len: usize,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `self` extended with `var -> term`. No consistency check is
    /// made here; unification only binds unbound variables.
    pub fn bind(&self, var: Var, term: Term) -> Bindings {
        Bindings {
            head: Some(Rc::new(Binding {
                var,
                term,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn lookup(&self, var: &Var) -> Option<&Term> {
        let mut node = self.head.as_deref();
        while let Some(b) = node {
            if &b.var == var {
                return Some(&b.term);
            }
            node = b.next.as_deref();
        }
        None
    }

    /// Number of bind operations that produced this environment.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The newest binding of each variable, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&Var, &Term)> {
        let mut seen = BTreeSet::new();
        let mut items = vec![];
        let mut node = self.head.as_deref();
        while let Some(b) = node {
            if seen.insert(&b.var) {
                items.push((&b.var, &b.term));
            }
            node = b.next.as_deref();
        }
        items.into_iter().rev()
    }

    /// Follows variable-to-variable links until reaching a non-variable term
    /// or an unbound variable. Only the outermost term is resolved.
    pub fn walk<'a>(&'a self, mut term: &'a Term) -> &'a Term {
        let mut hops = 0;
        while let Term::Var(v) = term {
            match self.lookup(v) {
                Some(t) if hops <= self.len => {
                    term = t;
                    hops += 1;
                }
                _ => break,
            }
        }
        term
    }

    /// Substitutes every bound variable in `term`, transitively, until no
    /// bound variable remains. Unbound variables are left in place.
    pub fn plug(&self, term: &Term) -> Term {
        let mut active = vec![];
        self.plug_impl(term, &mut active)
    }

    fn plug_impl(&self, term: &Term, active: &mut Vec<Var>) -> Term {
        match term {
            Term::Var(v) => {
                // A variable already being expanded on this path would loop
                // forever; only hand-built environments can contain one.
                if active.contains(v) {
                    return term.clone();
                }
                match self.lookup(v) {
                    Some(bound) => {
                        active.push(v.clone());
                        let plugged = self.plug_impl(bound, active);
                        active.pop();
                        plugged
                    }
                    None => term.clone(),
                }
            }
            Term::Array(items) => {
                Term::array(items.iter().map(|t| self.plug_impl(t, active)).collect())
            }
            Term::Object(fields) => Term::object(
                fields
                    .iter()
                    .map(|(k, v)| (self.plug_impl(k, active), self.plug_impl(v, active)))
                    .collect(),
            ),
            Term::Ref(r) => Term::Ref(Rc::new(Reference::new(
                r.base.clone(),
                r.path.iter().map(|t| self.plug_impl(t, active)).collect(),
            ))),
            _ => term.clone(),
        }
    }

    /// The ground bindings of non-wildcard variables as an object keyed by
    /// variable name.
    pub fn to_value(&self) -> Value {
        let mut object = BTreeMap::new();
        for (var, _) in self.iter() {
            if var.is_wildcard() {
                continue;
            }
            if let Some(v) = self.plug(&Term::Var(var.clone())).to_value() {
                object.insert(Value::from(var.name()), v);
            }
        }
        Value::from(object)
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Free-function form of [`Bindings::plug`].
pub fn plug(term: &Term, bindings: &Bindings) -> Term {
    bindings.plug(term)
}
