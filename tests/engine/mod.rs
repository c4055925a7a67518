// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use std::cell::Cell;
use topdown::*;

const DATA: &str = r#"{
    "a": [1, 2, 3, 4],
    "b": {"v1": "hello", "v2": "goodbye"},
    "c": [{"x": [true, false, "foo"], "y": [null, 3.14159], "z": {"p": true, "q": false}}]
}"#;

fn engine() -> Result<Engine> {
    let mut engine = Engine::new();
    engine.add_data(Value::from_json_str(DATA)?)?;
    Ok(engine)
}

#[test]
fn rules_from_file() -> Result<()> {
    let mut engine = engine()?;
    engine.add_rules_from_file("tests/engine/rules/example.rules")?;
    assert_eq!(engine.get_rules().len(), 3);

    assert_eq!(
        engine.eval_rule("values")?,
        Value::from_json_str("[1, 2, 3, 4]")?
    );
    assert_eq!(
        engine.eval_rule("greetings")?,
        Value::from_json_str(r#"{"v1": "hello", "v2": "goodbye"}"#)?
    );
    assert_eq!(engine.eval_rule("third")?, Value::from(3u64));
    Ok(())
}

#[test]
fn duplicate_rule() -> Result<()> {
    let mut engine = engine()?;
    engine.add_rule("p = 1 :- true")?;
    let err = engine.add_rule("p = 2 :- true").unwrap_err();
    assert!(err.to_string().contains("rule `p` is already defined"));
    Ok(())
}

#[test]
fn parse_errors_point_at_source() -> Result<()> {
    let mut engine = Engine::new();
    let err = engine
        .add_rules("bad.rules".to_string(), "p = 1 :- a[0 = 1".to_string())
        .unwrap_err()
        .to_string();
    assert!(err.contains("bad.rules:1:"), "{err}");
    assert!(err.contains("expecting `]`"), "{err}");
    Ok(())
}

#[test]
fn data_can_be_replaced() -> Result<()> {
    let mut engine = engine()?;
    engine.add_rule("p[x] :- a[_] = x")?;
    assert_eq!(engine.eval_rule("p")?, Value::from_json_str("[1, 2, 3, 4]")?);

    engine.clear_data();
    assert_eq!(engine.eval_rule("p")?, Value::new_array());

    engine.add_data(Value::from_json_str(r#"{"a": [9]}"#)?)?;
    assert_eq!(engine.eval_rule("p")?, Value::from_json_str("[9]")?);

    // Conflicting data is rejected.
    assert!(engine
        .add_data(Value::from_json_str(r#"{"a": [8]}"#)?)
        .is_err());
    Ok(())
}

#[test]
fn numbers_keep_their_spelling() -> Result<()> {
    let mut engine = engine()?;
    engine.add_rule("p = 3.0 :- true")?;
    engine.add_rule("q = x :- c[0].y[1] = x")?;
    assert_eq!(engine.eval_rule("p")?.to_string(), "3.0");
    assert_eq!(engine.eval_rule("q")?.to_string(), "3.14159");
    Ok(())
}

#[test]
fn query_results_serialize() -> Result<()> {
    let engine = engine()?;
    let results = engine.eval_query(r#"b[k] = "hello""#)?;
    assert_eq!(
        serde_json::to_string(&results)?,
        r#"{"result":[{"bindings":{"k":"v1"}}]}"#
    );

    let results = engine.eval_query("a[i] = 100")?;
    assert_eq!(serde_json::to_string(&results)?, "{}");
    Ok(())
}

#[test]
fn documents_and_errors_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<EvalError>();
    assert_send_sync::<Value>();
    assert_send_sync::<Term>();
    assert_send_sync::<Engine>();
}

#[test]
fn errors_downcast() -> Result<()> {
    let mut engine = engine()?;
    engine.add_rule("p[k] = v :- a[k] = v")?;
    let err = engine.eval_rule("p").unwrap_err();
    match err.downcast_ref::<EvalError>() {
        Some(EvalError::NonStringObjectKey(k)) => assert_eq!(k, &Value::from(0u64)),
        _ => bail!("unexpected error {err}"),
    }
    Ok(())
}

#[test]
fn strict_documents() -> Result<()> {
    let mut engine = engine()?;
    engine.add_rule("p = x :- a[_] = x")?;
    assert_eq!(engine.eval_rule("p")?, Value::from(1u64));

    engine.set_strict_documents(true);
    let err = engine.eval_rule("p").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::ConflictingValues(_, _))
    ));
    Ok(())
}

// A store that counts lookups, to check that evaluation only goes through
// the trait.
struct CountingStore {
    inner: DataStore,
    gets: Cell<usize>,
}

impl Store for CountingStore {
    fn get(&self, path: &[Value]) -> Option<Value> {
        self.gets.set(self.gets.get() + 1);
        self.inner.get(path)
    }
}

#[test]
fn custom_store() -> Result<()> {
    let store = CountingStore {
        inner: DataStore::from_json_str(DATA)?,
        gets: Cell::new(0),
    };
    let rule = parse_rule("p[x] :- b[_] = x")?;
    let doc = evaluate(&rule, &Bindings::new(), &store)?;
    assert_eq!(doc, Value::from_json_str(r#"["goodbye", "hello"]"#)?);
    assert!(store.gets.get() > 0);
    Ok(())
}

#[test]
fn eval_terms_with_initial_bindings() -> Result<()> {
    let store = DataStore::from_json_str(DATA)?;
    let rule = parse_rule("p[x] :- a[i] = x")?;
    let bindings = Bindings::new().bind(Var::new("i"), Term::from(1u64));

    let ctx = Context::new(&store)
        .with_rule(&rule)
        .with_bindings(bindings.clone());
    let mut seen = vec![];
    eval_terms(&ctx, &mut |ctx| {
        seen.push(ctx.bindings.to_value());
        Ok(())
    })?;
    assert_eq!(
        Value::from(seen),
        Value::from_json_str(r#"[{"i": 1, "x": 2}]"#)?
    );

    assert_eq!(
        evaluate(&rule, &bindings, &store)?,
        Value::from_json_str("[2]")?
    );
    Ok(())
}

#[test]
fn continuation_errors_stop_evaluation() -> Result<()> {
    let store = DataStore::from_json_str(DATA)?;
    let body = parse_query("a[i] = x")?;
    let ctx = Context::new(&store);

    let mut calls = 0;
    let err = eval_query(&ctx, &body, &mut |_| {
        calls += 1;
        bail!("stop here")
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "stop here");
    assert_eq!(calls, 1);
    Ok(())
}

#[test]
fn eval_ref_enumerates_paths() -> Result<()> {
    let store = DataStore::from_json_str(DATA)?;
    let ctx = Context::new(&store);
    let reference = match parse_term("c[i][j][k]")? {
        Term::Ref(r) => r,
        t => bail!("expected a reference, got {t}"),
    };

    let mut found = vec![];
    eval_ref(&ctx, &reference, &mut |ctx, value| {
        found.push((ctx.bindings.to_value(), value.clone()));
        Ok(())
    })?;

    assert_eq!(found.len(), 7);
    assert_eq!(
        found[5],
        (
            Value::from_json_str(r#"{"i": 0, "j": "z", "k": "p"}"#)?,
            Value::Bool(true)
        )
    );
    Ok(())
}

#[test]
fn plug_substitutes_transitively() -> Result<()> {
    let bindings = Bindings::new()
        .bind(Var::new("a"), Term::var("b"))
        .bind(Var::new("b"), parse_term("[c]")?)
        .bind(Var::new("c"), parse_term(r#"{"hello": v}"#)?)
        .bind(Var::new("v"), Term::from("world"));
    assert_eq!(
        plug(&Term::var("a"), &bindings),
        parse_term(r#"[{"hello": "world"}]"#)?
    );
    Ok(())
}
