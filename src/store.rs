// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;

use anyhow::{bail, Result};

/// Read-only access to a hierarchical document.
///
/// A path is a sequence of ground keys: strings for object members and
/// integral numbers for array indices. The returned node is either a scalar
/// or a collection whose (key, child) pairs are enumerated with
/// [`Value::entries`].
pub trait Store {
    fn get(&self, path: &[Value]) -> Option<Value>;
}

/// A store backed by an in-memory JSON-like document.
#[derive(Debug, Clone)]
pub struct DataStore {
    data: Value,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            data: Value::new_object(),
        }
    }

    pub fn from_value(data: Value) -> Result<Self> {
        if data.as_object().is_err() {
            bail!("store root must be an object, found `{data}`");
        }
        Ok(Self { data })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(Value::from_json_str(json)?)
    }

    /// Adds documents to the store. Overlapping keys must agree.
    pub fn merge(&mut self, data: Value) -> Result<()> {
        if data.as_object().is_err() {
            bail!("data must be an object, found `{data}`");
        }
        self.data.merge(data)
    }

    pub fn clear(&mut self) {
        self.data = Value::new_object();
    }

    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl Store for DataStore {
    fn get(&self, path: &[Value]) -> Option<Value> {
        let mut node = &self.data;
        for key in path {
            node = &node[key];
            if node.is_undefined() {
                return None;
            }
        }
        Some(node.clone())
    }
}
