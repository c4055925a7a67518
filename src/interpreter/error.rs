// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::term::{Term, Var};
use crate::value::Value;

use thiserror::Error;

/// Hard errors raised during evaluation.
///
/// A failed match is never an error: it simply produces no solutions. These
/// abort the whole evaluation and reach the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// An object pattern whose key is, or contains, an unbound variable.
    #[error("cannot unify object with variable key: {0}")]
    VariableObjectKey(Var),

    /// A partial-object rule produced a key that is not a string.
    #[error("cannot produce object with non-string key: {0}")]
    NonStringObjectKey(Value),

    /// A rule head that is still not ground once the body is satisfied.
    #[error("cannot produce document with non-ground value: {0}")]
    NonGroundValue(Term),

    /// Strict mode: a complete rule produced two different values.
    #[error("complete rule produced conflicting values: {0} and {1}")]
    ConflictingValues(Value, Value),

    /// Strict mode: a partial-object rule produced two values for one key.
    #[error("object key {key} generated multiple times: {first} and {second}")]
    ConflictingObjectKey {
        key: Value,
        first: Value,
        second: Value,
    },

    /// A bare variable expression whose variable is not bound.
    #[error("cannot evaluate unbound variable: {0}")]
    UnboundVariable(Var),
}
