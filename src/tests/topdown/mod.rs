// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::env;

use crate::tests::common::{match_values, process_value};
use crate::*;

use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    data: Option<Value>,
    rule: Option<String>,
    query: Option<String>,
    // `want_result: null` expects a null document, not a missing field.
    #[serde(default, deserialize_with = "deserialize_present")]
    want_result: Option<Value>,
    error: Option<String>,
    #[serde(default)]
    strict: bool,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct YamlTest {
    // Shared by every case that does not carry its own data.
    data: Option<Value>,
    cases: Vec<TestCase>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn eval_case(case: &TestCase, shared_data: &Option<Value>) -> Result<Value> {
    let mut engine = Engine::new();
    engine.set_strict_documents(case.strict);

    if let Some(data) = case.data.as_ref().or(shared_data.as_ref()) {
        engine.add_data(data.clone())?;
    }

    match (&case.rule, &case.query) {
        (Some(rule), None) => {
            let name = parse_rule(rule)?.name;
            engine.add_rule(rule)?;
            engine.eval_rule(&name)
        }
        (None, Some(query)) => {
            let results = engine.eval_query(query)?;
            Ok(Value::from(
                results
                    .result
                    .into_iter()
                    .map(|r| r.bindings)
                    .collect::<Vec<_>>(),
            ))
        }
        _ => bail!("exactly one of rule or query must be specified in test case."),
    }
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    std::println!("running {file}");

    for case in test.cases {
        std::print!("case {} ", case.note);
        if case.skip == Some(true) {
            std::println!("skipped");
            continue;
        }

        match (&case.want_result, &case.error) {
            (Some(_), None) | (None, Some(_)) => (),
            _ => panic!("either want_result or error must be specified in test case."),
        }

        match eval_case(&case, &test.data) {
            Ok(result) => match &case.want_result {
                Some(want_result) => {
                    let expected = process_value(want_result)?;
                    match_values(&result, &expected)?;
                }
                _ => bail!("eval succeeded and did not produce any errors"),
            },
            Err(actual) => match &case.error {
                Some(expected) => {
                    let actual = actual.to_string();
                    if !actual.contains(expected) {
                        bail!(
                            "Error message\n`{}\n`\ndoes not contain `{}`",
                            actual,
                            expected
                        );
                    }
                    std::println!("{actual}");
                }
                _ => return Err(actual),
            },
        }

        std::println!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{e}");
        }
    }
}

#[test]
#[ignore = "intended for running a single yaml file"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();

    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
        }
    }

    if file.is_empty() {
        bail!("missing <yaml-file>");
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/topdown/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
fn eval_rule_reports_missing_rule() -> Result<()> {
    let engine = Engine::new();
    let err = engine.eval_rule("p").unwrap_err();
    assert!(err.to_string().contains("rule `p` is not defined"));
    Ok(())
}
