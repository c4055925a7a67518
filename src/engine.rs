// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::bindings::Bindings;
use crate::interpreter::document::{evaluate_with, EvalOptions};
use crate::interpreter::{self, Context, QueryResult, QueryResults};
use crate::lexer::Source;
use crate::parser::{self, Parser};
use crate::store::DataStore;
use crate::value::*;

use std::convert::AsRef;
use std::path::Path;

use anyhow::{bail, Result};
use log::info;

/// Evaluation engine: a data store plus a set of named rules.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    store: DataStore,
    rules: Vec<Rule>,
    options: EvalOptions,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_parsed_rules(&mut self, rules: Vec<Rule>) -> Result<()> {
        for rule in rules {
            if self.rules.iter().any(|r| r.name == rule.name) {
                bail!("rule `{}` is already defined", rule.name);
            }
            info!("added rule {rule}");
            self.rules.push(rule);
        }
        Ok(())
    }

    /// Adds a single rule.
    pub fn add_rule(&mut self, rule: &str) -> Result<()> {
        self.add_parsed_rules(vec![parser::parse_rule(rule)?])
    }

    /// Adds every rule in `rules`. `path` is used in error messages.
    pub fn add_rules(&mut self, path: String, rules: String) -> Result<()> {
        let source = Source::from_contents(path, rules)?;
        let mut parser = Parser::new(&source)?;
        let rules = parser.parse_rules()?;
        self.add_parsed_rules(rules)
    }

    pub fn add_rules_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let source = Source::from_file(path)?;
        let mut parser = Parser::new(&source)?;
        let rules = parser.parse_rules()?;
        self.add_parsed_rules(rules)
    }

    pub fn get_rules(&self) -> &Vec<Rule> {
        &self.rules
    }

    pub fn clear_data(&mut self) {
        self.store.clear();
    }

    pub fn add_data(&mut self, data: Value) -> Result<()> {
        self.store.merge(data)
    }

    pub fn get_data(&self) -> &Value {
        self.store.data()
    }

    /// When set, complete rules with conflicting solutions and object rules
    /// with conflicting values for a key are errors.
    pub fn set_strict_documents(&mut self, strict: bool) {
        self.options.strict = strict;
    }

    /// Evaluates the rule called `name` and returns its document.
    pub fn eval_rule(&self, name: &str) -> Result<Value> {
        let rule = match self.rules.iter().find(|r| &*r.name == name) {
            Some(rule) => rule,
            None => bail!("rule `{name}` is not defined"),
        };
        evaluate_with(rule, &Bindings::new(), &self.store, &self.options)
    }

    /// Evaluates an ad-hoc query such as `a[i] = x, x`.
    ///
    /// Each solution contributes the bindings of the query's named
    /// variables.
    pub fn eval_query(&self, query: &str) -> Result<QueryResults> {
        let body = parser::parse_query(query)?;
        info!("evaluating query {query}");

        let mut results = QueryResults::default();
        let ctx = Context::new(&self.store);
        interpreter::eval_query(&ctx, &body, &mut |ctx| {
            results.result.push(QueryResult {
                bindings: ctx.bindings.to_value(),
            });
            Ok(())
        })?;
        Ok(results)
    }
}
