//! End-to-end dispatch scenarios through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use typed_dispatch::{
    init_tracing, Conversion, DispatchError, Signatures, TypeDef, Typed, Value,
};

fn num(value: &Value) -> f64 {
    value.as_number().expect("number argument")
}

fn concat(a: &Value, b: &Value) -> Value {
    Value::string(format!("{}{}", a.as_str().unwrap(), b.as_str().unwrap()))
}

#[test]
fn increments_numbers_only() {
    init_tracing();
    let typed = Typed::new();
    let inc = typed
        .build(
            Some("inc"),
            [Signatures::new().with("number", |args| Ok(Value::number(num(&args[0]) + 1.0)))],
        )
        .unwrap();

    assert_eq!(inc.call(&[Value::number(5)]), Ok(Value::number(6)));
    let err = inc.call(&[Value::from("x")]).unwrap_err();
    assert_eq!(
        err,
        DispatchError::WrongSignature {
            function: Some("inc".to_string()),
            index: 0,
            actual: "string".to_string(),
            expected: vec!["number".to_string()],
        }
    );
}

#[test]
fn adds_numbers_or_concatenates_strings() {
    let typed = Typed::new();
    let add = typed
        .build(
            Some("add"),
            [Signatures::new()
                .with("number, number", |args| {
                    Ok(Value::number(num(&args[0]) + num(&args[1])))
                })
                .with("string, string", |args| Ok(concat(&args[0], &args[1])))],
        )
        .unwrap();

    assert_eq!(
        add.call(&[Value::number(1), Value::number(2)]),
        Ok(Value::number(3))
    );
    assert_eq!(
        add.call(&[Value::from("a"), Value::from("b")]),
        Ok(Value::from("ab"))
    );
    let err = add.call(&[Value::number(1), Value::from("a")]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "add: wrong signature, unexpected type of argument 1 (expected: number, actual: string)"
    );
    let err = add.call(&[Value::number(1)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "add: wrong number of arguments (expected 2, got 1)"
    );
}

#[test]
fn variadic_counts_its_arguments() {
    let typed = Typed::new();
    let count = typed
        .build(
            Some("count"),
            [Signatures::new().with("number...", |args| {
                let rest = args[0].as_array().expect("rest array");
                Ok(Value::number(rest.len() as f64))
            })],
        )
        .unwrap();

    assert_eq!(count.call(&[Value::number(7)]), Ok(Value::number(1)));
    assert_eq!(
        count.call(&[Value::number(1), Value::number(2), Value::number(3)]),
        Ok(Value::number(3))
    );
    assert!(matches!(
        count.call(&[]),
        Err(DispatchError::WrongArgumentCount { got: 0, .. })
    ));
    let err = count
        .call(&[Value::number(1), Value::from("x")])
        .unwrap_err();
    assert!(matches!(err, DispatchError::WrongSignature { index: 1, .. }));
}

#[test]
fn guarded_conversion_to_even() {
    let typed = Typed::builder()
        .type_def(TypeDef::new("even", |v| {
            v.as_number().is_some_and(|n| n % 2.0 == 0.0)
        }))
        // Identity conversion; the `even` test acts as its guard.
        .conversion(Conversion::new("number", "even", Value::clone))
        .build()
        .unwrap();
    let half = typed
        .build(
            Some("half"),
            [Signatures::new().with("even", |args| Ok(Value::number(num(&args[0]) / 2.0)))],
        )
        .unwrap();

    assert_eq!(half.call(&[Value::number(8)]), Ok(Value::number(4)));
    let err = half.call(&[Value::number(3)]).unwrap_err();
    assert_eq!(
        err,
        DispatchError::WrongSignature {
            function: Some("half".to_string()),
            index: 0,
            actual: "number".to_string(),
            expected: vec!["even".to_string()],
        }
    );
}

#[test]
fn conversion_reaches_an_implementation() {
    let typed = Typed::builder()
        .conversion(Conversion::new("string", "number", |v| {
            Value::number(v.as_str().and_then(|s| s.parse::<f64>().ok()).unwrap_or(f64::NAN))
        }))
        .build()
        .unwrap();
    let double = typed
        .build(
            None,
            [Signatures::new().with("number", |args| Ok(Value::number(num(&args[0]) * 2.0)))],
        )
        .unwrap();
    assert_eq!(double.call(&[Value::from("21")]), Ok(Value::number(42)));
    assert!(double.call(&[Value::Bool(true)]).is_err());
}

#[test]
fn conversions_share_structure_with_direct_paths() {
    let typed = Typed::builder()
        .conversion(Conversion::new("boolean", "number", |v| {
            Value::number(if v.as_bool() == Some(true) { 1 } else { 0 })
        }))
        .build()
        .unwrap();
    let f = typed
        .build(
            None,
            [Signatures::new()
                .with("number, string", |_| Ok(Value::from("ns")))
                .with("number, number", |args| {
                    Ok(Value::number(num(&args[0]) + num(&args[1])))
                })],
        )
        .unwrap();
    assert_eq!(
        f.call(&[Value::Bool(true), Value::Bool(true)]),
        Ok(Value::number(2))
    );
    assert_eq!(
        f.call(&[Value::Bool(false), Value::from("s")]),
        Ok(Value::from("ns"))
    );
}

#[test]
fn wildcard_receives_everything_else() {
    let typed = Typed::new();
    let describe = typed
        .build(
            None,
            [Signatures::new()
                .with("*", |args| Ok(Value::string(args[0].kind_name())))
                .with("number", |_| Ok(Value::from("a number")))
                .with("Array", |args| {
                    Ok(Value::string(format!(
                        "array of {}",
                        args[0].as_array().map_or(0, <[Value]>::len)
                    )))
                })],
        )
        .unwrap();

    assert_eq!(describe.call(&[Value::number(1)]), Ok(Value::from("a number")));
    assert_eq!(
        describe.call(&[Value::array(vec![Value::Null, Value::Null])]),
        Ok(Value::from("array of 2"))
    );
    assert_eq!(describe.call(&[Value::Bool(false)]), Ok(Value::from("boolean")));
}

#[test]
fn implementation_errors_pass_through() {
    let typed = Typed::new();
    let div = typed
        .build(
            Some("div"),
            [Signatures::new().with("number, number", |args| {
                let d = num(&args[1]);
                if d == 0.0 {
                    return Err(DispatchError::custom("division by zero"));
                }
                Ok(Value::number(num(&args[0]) / d))
            })],
        )
        .unwrap();
    assert_eq!(
        div.call(&[Value::number(1), Value::number(0)]),
        Err(DispatchError::custom("division by zero"))
    );
}

#[test]
fn dispatcher_is_shared_across_threads() {
    let typed = Typed::new();
    let add = Arc::new(
        typed
            .build(
                Some("add"),
                [Signatures::new().with("number, number", |args| {
                    Ok(Value::number(num(&args[0]) + num(&args[1])))
                })],
            )
            .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let add = Arc::clone(&add);
            thread::spawn(move || {
                (0..100).fold(0.0, |acc, _| {
                    let result = add
                        .call(&[Value::number(acc), Value::number(i)])
                        .unwrap();
                    num(&result)
                })
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), 100.0 * i as f64);
    }
}

#[test]
fn registering_after_build_does_not_change_dispatchers() {
    let mut typed = Typed::new();
    let f = typed
        .build(None, [Signatures::new().with("number", |_| Ok(Value::Null))])
        .unwrap();
    typed
        .register_conversion(Conversion::new("string", "number", |_| Value::number(0)))
        .unwrap();
    assert!(f.call(&[Value::from("x")]).is_err());

    let g = typed
        .build(None, [Signatures::new().with("number", |_| Ok(Value::Null))])
        .unwrap();
    assert_eq!(g.call(&[Value::from("x")]), Ok(Value::Null));
}
