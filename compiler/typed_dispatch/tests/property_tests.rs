//! Property-based tests for dispatch ordering and signature handling.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use typed_dispatch::{normalize, Signatures, Typed, Value};

const BUILTINS: [&str; 6] = ["number", "string", "boolean", "Array", "null", "undefined"];

fn sample(ty: &str) -> Value {
    match ty {
        "number" => Value::number(1.5),
        "string" => Value::from("s"),
        "boolean" => Value::Bool(true),
        "Array" => Value::array(vec![]),
        "null" => Value::Null,
        _ => Value::Undefined,
    }
}

fn builtin() -> impl Strategy<Value = &'static str> {
    prop::sample::select(BUILTINS.to_vec())
}

proptest! {
    /// A specific type always wins over the wildcard, whatever the
    /// registration order and argument position.
    #[test]
    fn specific_beats_wildcard(
        types in prop::collection::vec(builtin(), 1..4),
        wildcard_first in any::<bool>(),
    ) {
        let specific = types.join(",");
        let wildcard = vec!["*"; types.len()].join(",");

        let mut signatures = Signatures::new();
        let entries = if wildcard_first {
            [(wildcard.clone(), "wildcard"), (specific.clone(), "specific")]
        } else {
            [(specific.clone(), "specific"), (wildcard.clone(), "wildcard")]
        };
        for (spec, label) in entries {
            signatures = signatures.with(spec, move |_| Ok(Value::from(label)));
        }

        let d = Typed::new().build(None, [signatures]).unwrap();
        let args: Vec<Value> = types.iter().map(|t| sample(t)).collect();
        prop_assert_eq!(d.call(&args), Ok(Value::from("specific")));

        // Any other first argument falls through to the wildcard.
        let other = BUILTINS.iter().find(|t| **t != types[0]).copied().unwrap();
        let mut args = args;
        args[0] = sample(other);
        prop_assert_eq!(d.call(&args), Ok(Value::from("wildcard")));
    }

    /// Normalization ignores whitespace and is idempotent.
    #[test]
    fn normalize_is_idempotent(
        slots in prop::collection::vec(prop::collection::vec(builtin(), 1..3), 0..4),
        pad in "[ \t]{0,2}",
    ) {
        let spec = slots
            .iter()
            .map(|alts| format!("{pad}{}{pad}", alts.join(&format!("{pad}|{pad}"))))
            .collect::<Vec<_>>()
            .join(",");
        let once = normalize(&spec).unwrap();
        prop_assert!(!once.contains(' '));
        prop_assert_eq!(normalize(&once).unwrap(), once.clone());
    }

    /// Every concrete combination of a union signature dispatches to it.
    #[test]
    fn union_covers_every_combination(
        first in prop::collection::btree_set(builtin(), 1..4),
        second in prop::collection::btree_set(builtin(), 1..4),
    ) {
        let spec = format!(
            "{}, {}",
            first.iter().copied().collect::<Vec<_>>().join("|"),
            second.iter().copied().collect::<Vec<_>>().join("|"),
        );
        let d = Typed::new()
            .build(None, [Signatures::new().with(spec, |_| Ok(Value::Bool(true)))])
            .unwrap();
        for a in &first {
            for b in &second {
                prop_assert_eq!(d.call(&[sample(a), sample(b)]), Ok(Value::Bool(true)));
            }
        }
    }
}
