use pretty_assertions::assert_eq;

use super::*;

#[test]
fn heap_values_share_allocation_on_clone() {
    let a = Value::array(vec![Value::number(1), Value::number(2)]);
    let b = a.clone();
    match (&a, &b) {
        (Value::Array(x), Value::Array(y)) => assert!(Heap::ptr_eq(x, y)),
        _ => panic!("expected arrays"),
    }
}

#[test]
fn structural_equality() {
    assert_eq!(Value::string("a"), Value::string("a"));
    assert_ne!(Value::string("a"), Value::string("b"));
    assert_eq!(
        Value::array(vec![Value::Null, Value::Bool(true)]),
        Value::array(vec![Value::Null, Value::Bool(true)])
    );
    assert_ne!(Value::Null, Value::Undefined);
    assert_ne!(Value::number(1), Value::string("1"));
}

#[test]
fn kind_names() {
    assert_eq!(Value::Undefined.kind_name(), "undefined");
    assert_eq!(Value::Null.kind_name(), "null");
    assert_eq!(Value::Bool(false).kind_name(), "boolean");
    assert_eq!(Value::number(0).kind_name(), "number");
    assert_eq!(Value::string("").kind_name(), "string");
    assert_eq!(Value::array(vec![]).kind_name(), "Array");
    assert_eq!(Value::object(ObjectMap::new()).kind_name(), "Object");
}

#[test]
fn accessors() {
    assert_eq!(Value::number(2.5).as_number(), Some(2.5));
    assert_eq!(Value::string("x").as_number(), None);
    assert_eq!(Value::string("x").as_str(), Some("x"));
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(
        Value::array(vec![Value::Null]).as_array(),
        Some(&[Value::Null][..])
    );
    assert!(Value::Null.is_null());
    assert!(Value::Undefined.is_undefined());
}

#[test]
fn display_renders_nested_values() {
    let value = Value::object_from([
        ("b", Value::array(vec![Value::number(1), Value::string("x")])),
        ("a", Value::Null),
    ]);
    assert_eq!(value.to_string(), "{a: null, b: [1, \"x\"]}");
}

#[test]
fn conversions_from_primitives() {
    assert_eq!(Value::from(3), Value::number(3));
    assert_eq!(Value::from("hi"), Value::string("hi"));
    assert_eq!(Value::from(true), Value::Bool(true));
}
