//! Error detail for calls no signature accepts.
//!
//! Runs only after the compiled matchers have failed, so it favours clarity
//! over speed. It walks an outline of every group that accepts the argument
//! count, following exactly the direct tests and wired conversions the
//! matchers use, and reports the deepest argument position any path reached
//! together with the types expected there.

use std::sync::Arc;

use typed_value::Value;

use crate::errors::{wrong_signature, DispatchError};
use crate::tree::Arity;
use crate::types::{TypeRegistry, TypeTest};

use super::{RestArm, WiredConversion};

/// Shape of one compiled subtree, kept for diagnostics.
pub(super) enum Outline {
    /// Tests the argument at `depth`.
    Branch {
        depth: usize,
        /// Children in test order.
        direct: Vec<(String, TypeTest, Outline)>,
        /// Conversions wired here, each with the index of its target in `direct`.
        converted: Vec<(WiredConversion, usize)>,
    },
    /// Collects every argument from `depth` on.
    Rest { depth: usize, arms: Arc<[RestArm]> },
    Leaf,
}

impl Outline {
    fn explore(&self, args: &[Value], furthest: &mut Furthest) {
        match self {
            Outline::Branch {
                depth,
                direct,
                converted,
            } => {
                let Some(arg) = args.get(*depth) else {
                    return;
                };
                furthest.reach(*depth, direct.iter().map(|(name, _, _)| name.as_str()));
                for (_, test, child) in direct {
                    if test(arg) {
                        child.explore(args, furthest);
                    }
                }
                for (conversion, target) in converted {
                    if conversion.apply(arg).is_some() {
                        direct[*target].2.explore(args, furthest);
                    }
                }
            }
            Outline::Rest { depth, arms } => {
                let rest = args.get(*depth..).unwrap_or_default();
                for arm in arms.iter() {
                    if let Some(offset) = rest.iter().position(|arg| arm.accept(arg).is_none()) {
                        furthest.reach(depth + offset, arm.names());
                    }
                }
            }
            Outline::Leaf => {}
        }
    }
}

/// Deepest argument position reached so far and the types expected there.
#[derive(Default)]
struct Furthest {
    index: Option<usize>,
    expected: Vec<String>,
}

impl Furthest {
    fn reach<'a>(&mut self, index: usize, names: impl IntoIterator<Item = &'a str>) {
        match self.index {
            Some(current) if index < current => return,
            Some(current) if index == current => {}
            _ => {
                self.index = Some(index);
                self.expected.clear();
            }
        }
        for name in names {
            if !self.expected.iter().any(|known| known == name) {
                self.expected.push(name.to_string());
            }
        }
    }
}

pub(super) struct Diagnostics {
    groups: Vec<(Arity, Outline)>,
    /// Registered types in registration order, for naming the actual type.
    types: Vec<(String, TypeTest)>,
}

impl Diagnostics {
    pub(super) fn new(groups: Vec<(Arity, Outline)>, types: &TypeRegistry) -> Self {
        let types = types
            .iter()
            .map(|t| (t.name.clone(), t.test.clone()))
            .collect();
        Diagnostics { groups, types }
    }

    fn type_of(&self, value: &Value) -> &str {
        self.types
            .iter()
            .find(|(_, test)| test(value))
            .map_or("unknown", |(name, _)| name.as_str())
    }

    /// Build a `WrongSignature` error naming the deepest argument any path reached.
    pub(super) fn wrong_signature(&self, function: Option<&str>, args: &[Value]) -> DispatchError {
        let mut furthest = Furthest::default();
        for (arity, outline) in &self.groups {
            if arity.accepts(args.len()) {
                outline.explore(args, &mut furthest);
            }
        }

        let index = furthest.index.unwrap_or(0);
        let actual = args.get(index).map_or("undefined", |arg| self.type_of(arg));
        wrong_signature(function, index, actual, furthest.expected)
    }
}
