#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use typed_value::Value;

use super::*;

fn noop() -> Implementation {
    Implementation::new(|_| Ok(Value::Undefined))
}

fn keys(concrete: &[ConcreteSignature]) -> Vec<String> {
    concrete.iter().map(ConcreteSignature::key).collect()
}

// Parsing

#[test]
fn parse_normalizes_whitespace() {
    let sig = Signature::parse(" number | string ,  boolean ", noop()).expect("parse");
    assert_eq!(sig.key(), "number|string,boolean");
    assert_eq!(sig.params().len(), 2);
    assert_eq!(sig.params()[0].types(), ["number", "string"]);
    assert!(!sig.is_variadic());
}

#[test]
fn empty_spec_is_zero_parameter_signature() {
    let sig = Signature::parse("", noop()).expect("parse");
    assert!(sig.params().is_empty());
    assert_eq!(sig.key(), "");
    assert_eq!(keys(&sig.split()), vec![String::new()]);
}

#[test]
fn duplicate_alternatives_collapse() {
    let sig = Signature::parse("number|number|string", noop()).expect("parse");
    assert_eq!(sig.params()[0].types(), ["number", "string"]);
}

#[test]
fn variadic_suffix_and_prefix() {
    let suffix = Signature::parse("string, number...", noop()).expect("parse");
    assert!(suffix.is_variadic());
    assert_eq!(suffix.key(), "string,number...");

    let prefix = Signature::parse("string, ...number|boolean", noop()).expect("parse");
    assert!(prefix.is_variadic());
    assert_eq!(prefix.key(), "string,number|boolean...");
}

#[test]
fn variadic_on_non_final_slot_is_syntax_error() {
    let err = Signature::parse("number..., string", noop()).expect_err("misplaced marker");
    assert!(matches!(err, DispatchError::Syntax { .. }));
    assert!(err.to_string().contains("must be the last parameter"));
}

#[test]
fn malformed_specs_are_syntax_errors() {
    for spec in [
        "number,,string",
        "number,",
        "number|",
        "|string",
        "...",
        "number...|string",
        "...number...",
        "big number",
    ] {
        let result = Signature::parse(spec, noop());
        assert!(
            matches!(result, Err(DispatchError::Syntax { .. })),
            "expected syntax error for {spec:?}"
        );
    }
}

#[test]
fn from_slots_matches_text_form() {
    let slots = Signature::from_slots(&["number|string", "boolean..."], noop()).expect("slots");
    let text = Signature::parse("number|string,boolean...", noop()).expect("text");
    assert_eq!(slots.key(), text.key());
    assert_eq!(slots.params(), text.params());

    assert!(matches!(
        Signature::from_slots(&["a,b"], noop()),
        Err(DispatchError::Syntax { .. })
    ));
}

#[test]
fn normalize_signature_text() {
    assert_eq!(normalize("number , string|boolean").expect("ok"), "number,string|boolean");
    assert_eq!(normalize("...Array").expect("ok"), "Array...");
    assert!(normalize("number,,").is_err());
}

// Splitting

#[test]
fn split_is_cartesian_product_in_declaration_order() {
    let sig = Signature::parse("number|string, boolean|null", noop()).expect("parse");
    assert_eq!(sig.expansion_count(), 4);
    assert_eq!(
        keys(&sig.split()),
        vec![
            "number,boolean",
            "number,null",
            "string,boolean",
            "string,null"
        ]
    );
}

#[test]
fn split_of_concrete_signature_is_itself() {
    let sig = Signature::parse("number,string", noop()).expect("parse");
    let concrete = sig.split();
    assert_eq!(concrete.len(), 1);
    assert_eq!(concrete[0].types(), ["number", "string"]);
    assert_eq!(concrete[0].arity(), Arity::Exact(2));
}

#[test]
fn split_keeps_variadic_union_whole() {
    let implementation = noop();
    let sig = Signature::parse("string|null, number|boolean...", implementation.clone())
        .expect("parse");
    assert_eq!(sig.expansion_count(), 2);
    let concrete = sig.split();
    assert_eq!(
        keys(&concrete),
        vec!["string,number|boolean...", "null,number|boolean..."]
    );
    for c in &concrete {
        assert!(c.is_variadic());
        assert_eq!(c.arity(), Arity::AtLeast(2));
        assert_eq!(
            c.rest_types().expect("rest").collect::<Vec<_>>(),
            vec!["number", "boolean"]
        );
        assert!(Implementation::ptr_eq(c.implementation(), &implementation));
    }
}

#[test]
fn mentions_checks_every_slot() {
    let sig = Signature::parse("number, string", noop()).expect("parse");
    let concrete = &sig.split()[0];
    assert!(concrete.mentions("string"));
    assert!(!concrete.mentions("boolean"));
    assert!(concrete.rest_types().is_none());

    let sig = Signature::parse("number, string|boolean...", noop()).expect("parse");
    assert!(sig.split()[0].mentions("boolean"));
}

#[test]
fn retain_types_drops_alternatives_and_empty_slots() {
    let sig = Signature::parse("number|Date, string|Date...", noop()).expect("parse");
    let kept = sig.retain_types(|t| t != "Date").expect("slots remain");
    assert_eq!(kept.key(), "number,string...");
    assert!(Implementation::ptr_eq(kept.implementation(), sig.implementation()));

    let sig = Signature::parse("Date, number", noop()).expect("parse");
    assert!(sig.retain_types(|t| t != "Date").is_none());
}

// Properties

fn type_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["number", "string", "boolean", "Array", "null", "Object"])
        .prop_map(str::to_string)
}

fn slot() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(type_name(), 1..4).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn split_size_is_product_of_alternatives(
        slots in prop::collection::vec(slot(), 0..5),
        variadic in any::<bool>(),
    ) {
        let mut spec = slots
            .iter()
            .map(|alts| alts.join("|"))
            .collect::<Vec<_>>()
            .join(",");
        if variadic && !slots.is_empty() {
            spec.push_str("...");
        }
        let implementation = noop();
        let sig = Signature::parse(&spec, implementation.clone()).expect("generated spec parses");
        // The variadic slot is kept whole.
        let expanded = if variadic { slots.len().saturating_sub(1) } else { slots.len() };
        let expected: usize = slots[..expanded].iter().map(Vec::len).product();
        let concrete = sig.split();

        prop_assert_eq!(concrete.len(), expected);
        prop_assert_eq!(sig.expansion_count(), expected);
        for c in &concrete {
            prop_assert_eq!(c.types().len(), slots.len());
            prop_assert!(Implementation::ptr_eq(c.implementation(), &implementation));
        }
        let mut unique = keys(&concrete);
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), expected);
    }
}
