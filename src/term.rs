// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::number::Number;
use crate::value::Value;

use core::cmp::Ordering;
use core::fmt;
use std::collections::BTreeMap;
use crate::Rc;

/// A named placeholder. Two variables are the same variable iff their names
/// are equal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(Rc<str>);

impl Var {
    pub fn new(name: &str) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Wildcards are generated by the parser for `_` and are never reported
    /// in query results.
    pub fn is_wildcard(&self) -> bool {
        self.0.starts_with('$')
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Var {
    fn from(name: &str) -> Self {
        Var::new(name)
    }
}

/// A path into the store: `base[seg1][seg2]...`.
#[derive(Debug, Clone)]
pub struct Reference {
    pub base: Var,
    pub path: Vec<Term>,
}

impl Reference {
    pub fn new(base: Var, path: Vec<Term>) -> Self {
        Self { base, path }
    }
}

/// A term of the policy language.
#[derive(Debug, Clone)]
pub enum Term {
    Null,
    Bool(bool),
    Number(Number),
    String(Rc<str>),
    Array(Rc<Vec<Term>>),
    // Keys are kept in source order. They need not be ground in a pattern.
    Object(Rc<Vec<(Term, Term)>>),
    Var(Var),
    Ref(Rc<Reference>),
}

impl Term {
    pub fn var(name: &str) -> Term {
        Term::Var(Var::new(name))
    }

    pub fn string(s: &str) -> Term {
        Term::String(s.into())
    }

    pub fn array(items: Vec<Term>) -> Term {
        Term::Array(Rc::new(items))
    }

    pub fn object(fields: Vec<(Term, Term)>) -> Term {
        Term::Object(Rc::new(fields))
    }

    pub fn reference(base: &str, path: Vec<Term>) -> Term {
        Term::Ref(Rc::new(Reference::new(Var::new(base), path)))
    }

    // Cross-kind rank. Variables and references rank after every ground
    // kind so that the order stays total over all terms.
    fn rank(&self) -> u8 {
        match self {
            Term::Null => 0,
            Term::Bool(_) => 1,
            Term::Number(_) => 2,
            Term::String(_) => 3,
            Term::Array(_) => 4,
            Term::Object(_) => 5,
            Term::Var(_) => 6,
            Term::Ref(_) => 7,
        }
    }

    /// Total order over terms. Over ground terms this agrees with the order
    /// of the corresponding [`Value`]s.
    pub fn compare(&self, other: &Term) -> Ordering {
        match (self, other) {
            (Term::Null, Term::Null) => Ordering::Equal,
            (Term::Bool(a), Term::Bool(b)) => a.cmp(b),
            (Term::Number(a), Term::Number(b)) => a.cmp(b),
            (Term::String(a), Term::String(b)) => a.cmp(b),
            (Term::Array(a), Term::Array(b)) => cmp_seq(a.iter(), b.iter()),
            (Term::Object(a), Term::Object(b)) => {
                let a = sorted_fields(a);
                let b = sorted_fields(b);
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    match ka.compare(kb).then_with(|| va.compare(vb)) {
                        Ordering::Equal => (),
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            (Term::Var(a), Term::Var(b)) => a.cmp(b),
            (Term::Ref(a), Term::Ref(b)) => a
                .base
                .cmp(&b.base)
                .then_with(|| cmp_seq(a.path.iter(), b.path.iter())),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// A term is ground iff it contains no variable.
    pub fn is_ground(&self) -> bool {
        self.first_var().is_none()
    }

    /// The leftmost variable in the term, if any.
    pub fn first_var(&self) -> Option<&Var> {
        match self {
            Term::Var(v) => Some(v),
            Term::Array(items) => items.iter().find_map(Term::first_var),
            Term::Object(fields) => fields
                .iter()
                .find_map(|(k, v)| k.first_var().or_else(|| v.first_var())),
            Term::Ref(r) => r.path.iter().find_map(Term::first_var),
            _ => None,
        }
    }

    /// Occurs check: does `var` appear anywhere in this term?
    pub fn contains_var(&self, var: &Var) -> bool {
        match self {
            Term::Var(v) => v == var,
            Term::Array(items) => items.iter().any(|t| t.contains_var(var)),
            Term::Object(fields) => fields
                .iter()
                .any(|(k, v)| k.contains_var(var) || v.contains_var(var)),
            Term::Ref(r) => r.path.iter().any(|t| t.contains_var(var)),
            _ => false,
        }
    }

    pub fn has_refs(&self) -> bool {
        match self {
            Term::Ref(_) => true,
            Term::Array(items) => items.iter().any(Term::has_refs),
            Term::Object(fields) => fields.iter().any(|(k, v)| k.has_refs() || v.has_refs()),
            _ => false,
        }
    }

    /// Converts a ground, reference-free term to a value.
    pub fn to_value(&self) -> Option<Value> {
        Some(match self {
            Term::Null => Value::Null,
            Term::Bool(b) => Value::Bool(*b),
            Term::Number(n) => Value::Number(n.clone()),
            Term::String(s) => Value::String(s.clone()),
            Term::Array(items) => {
                let mut array = Vec::with_capacity(items.len());
                for item in items.iter() {
                    array.push(item.to_value()?);
                }
                Value::from(array)
            }
            Term::Object(fields) => {
                let mut object = BTreeMap::new();
                for (k, v) in fields.iter() {
                    object.insert(k.to_value()?, v.to_value()?);
                }
                Value::from(object)
            }
            Term::Var(_) | Term::Ref(_) => return None,
        })
    }
}

fn cmp_seq<'a>(
    mut a: impl Iterator<Item = &'a Term>,
    mut b: impl Iterator<Item = &'a Term>,
) -> Ordering {
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) => match x.compare(y) {
                Ordering::Equal => (),
                ord => return ord,
            },
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
        }
    }
}

fn sorted_fields(fields: &[(Term, Term)]) -> Vec<&(Term, Term)> {
    let mut sorted: Vec<&(Term, Term)> = fields.iter().collect();
    sorted.sort_by(|(ka, va), (kb, vb)| ka.compare(kb).then_with(|| va.compare(vb)));
    sorted
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Term {}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::from(&value)
    }
}

impl From<&Value> for Term {
    fn from(value: &Value) -> Self {
        match value {
            // Undefined never reaches a term; treat it as null.
            Value::Null | Value::Undefined => Term::Null,
            Value::Bool(b) => Term::Bool(*b),
            Value::Number(n) => Term::Number(n.clone()),
            Value::String(s) => Term::String(s.clone()),
            Value::Array(items) => Term::array(items.iter().map(Term::from).collect()),
            Value::Object(fields) => Term::object(
                fields
                    .iter()
                    .map(|(k, v)| (Term::from(k), Term::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Number> for Term {
    fn from(n: Number) -> Self {
        Term::Number(n)
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Bool(b)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::string(s)
    }
}

impl From<u64> for Term {
    fn from(n: u64) -> Self {
        Term::Number(Number::from(n))
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for seg in &self.path {
            write!(f, "[{seg}]")?;
        }
        Ok(())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Null => f.write_str("null"),
            Term::Bool(b) => write!(f, "{b}"),
            Term::Number(n) => write!(f, "{n}"),
            Term::String(s) => match serde_json::to_string(s.as_ref()) {
                Ok(s) => f.write_str(&s),
                Err(_) => Err(fmt::Error),
            },
            Term::Array(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Term::Object(fields) => {
                f.write_str("{")?;
                for (idx, (k, v)) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Term::Var(v) => write!(f, "{v}"),
            Term::Ref(r) => write!(f, "{r}"),
        }
    }
}
