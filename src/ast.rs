// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::term::Term;

use core::fmt;
use crate::Rc;

/// One conjunct of a rule body.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `A = B`: unify the two sides.
    Eq(Term, Term),

    /// A bare term, typically a reference. Satisfied when its value is
    /// defined and not `false`.
    Term(Term),
}

/// Head shape of a rule.
#[derive(Debug, Clone)]
pub enum RuleHead {
    /// `p = value :- body`. The document is a single value.
    Scalar { value: Term },

    /// `p[key] :- body`. The document is the sorted set of keys.
    Set { key: Term },

    /// `p[key] = value :- body`. The document is an object.
    Object { key: Term, value: Term },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: Rc<str>,
    pub head: RuleHead,
    pub body: Vec<Expr>,
}

impl Rule {
    pub fn new(name: &str, head: RuleHead, body: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            head,
            body,
        }
    }

    pub fn scalar(name: &str, value: Term, body: Vec<Expr>) -> Self {
        Self::new(name, RuleHead::Scalar { value }, body)
    }

    pub fn set(name: &str, key: Term, body: Vec<Expr>) -> Self {
        Self::new(name, RuleHead::Set { key }, body)
    }

    pub fn object(name: &str, key: Term, value: Term, body: Vec<Expr>) -> Self {
        Self::new(name, RuleHead::Object { key, value }, body)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Eq(a, b) => write!(f, "{a} = {b}"),
            Expr::Term(t) => write!(f, "{t}"),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.head {
            RuleHead::Scalar { value } => write!(f, "{} = {value}", self.name)?,
            RuleHead::Set { key } => write!(f, "{}[{key}]", self.name)?,
            RuleHead::Object { key, value } => write!(f, "{}[{key}] = {value}", self.name)?,
        }
        f.write_str(" :- ")?;
        for (idx, expr) in self.body.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}
