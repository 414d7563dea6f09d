//! Dispatcher compiler: turns a `DispatchTree` into a closure chain.
//!
//! The tree is walked once. Every branch becomes a closure that tests one
//! argument against its children's predicates (in sibling order, see
//! `TypeRegistry::order_key`) and then against the conversions wired for that
//! branch. Every leaf becomes a closure invoking its implementation. Calls
//! afterwards pay only for the predicate tests on the path they take; the
//! tree itself is dropped.
//!
//! # Matching
//!
//! A matcher receives the call arguments and an accumulator of the
//! (possibly converted) arguments matched so far. It returns `None` when no
//! path below it accepts the call, leaving the accumulator as it found it, so
//! the caller can move on to the next sibling. This makes matching backtrack:
//! a value that passes `number` but finds no path below it is still offered
//! to `*` and then to the conversions at the same depth.
//!
//! # Variadic Groups
//!
//! In an `AtLeast(n)` group the branch at depth `n - 1` is a rest branch.
//! Its children are keyed by the whole variadic union (`number|string`); a
//! child matches when every remaining argument passes one of its alternatives
//! (directly or through a wired conversion), and the implementation receives
//! them as one array.
//!
//! # Diagnostics
//!
//! Alongside each matcher the compiler emits an `Outline` of the same subtree
//! with the same wiring. It is walked only after a call fails, to name the
//! furthest argument any path reached.

mod diagnose;

use std::sync::Arc;

use typed_value::Value;

use crate::conversions::{ConversionRegistry, ConvertFn};
use crate::dispatcher::Implementation;
use crate::errors::{wrong_argument_count, DispatchError, DispatchResult};
use crate::tree::{Arity, DispatchNode, DispatchTree};
use crate::signature::alternatives;
use crate::types::{TypeRegistry, TypeTest};

use diagnose::{Diagnostics, Outline};

/// Compiled matcher for one subtree.
type Matcher = Arc<dyn Fn(&[Value], &mut Vec<Value>) -> Option<DispatchResult> + Send + Sync>;

/// A conversion wired into one branch.
#[derive(Clone)]
struct WiredConversion {
    from: TypeTest,
    convert: ConvertFn,
    /// Predicate of the target type; the converted value must pass it.
    to: TypeTest,
}

impl WiredConversion {
    /// Convert `arg` if it has the source type and the result passes the target guard.
    #[inline]
    fn apply(&self, arg: &Value) -> Option<Value> {
        if !(self.from)(arg) {
            return None;
        }
        let converted = (self.convert)(arg);
        (self.to)(&converted).then_some(converted)
    }
}


/// The routine a dispatcher runs on every call.
pub struct CompiledRoutine {
    groups: Vec<(Arity, Matcher)>,
    max_params: usize,
    diagnostics: Diagnostics,
}

impl CompiledRoutine {
    /// Route a call.
    ///
    /// The outer `Err` means no signature accepted the arguments; the inner
    /// result is whatever the selected implementation returned.
    pub fn invoke(
        &self,
        function: Option<&str>,
        args: &[Value],
    ) -> Result<DispatchResult, DispatchError> {
        let mut matched_arity = false;
        let mut acc = Vec::with_capacity(args.len());
        for (arity, matcher) in &self.groups {
            if !arity.accepts(args.len()) {
                continue;
            }
            matched_arity = true;
            if let Some(result) = matcher(args, &mut acc) {
                return Ok(result);
            }
            acc.clear();
        }

        if matched_arity {
            Err(self.diagnostics.wrong_signature(function, args))
        } else {
            Err(wrong_argument_count(
                function,
                args.len(),
                self.expected_arities(),
            ))
        }
    }

    /// Declared arities, in dispatch order.
    pub fn arities(&self) -> impl Iterator<Item = Arity> + '_ {
        self.groups.iter().map(|(arity, _)| *arity)
    }

    /// Largest declared parameter count.
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    fn expected_arities(&self) -> String {
        if self.groups.is_empty() {
            return "none".to_string();
        }
        self.arities()
            .map(|arity| arity.to_string())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// Compile a tree against the current registries.
///
/// Every type name in the tree and every wired conversion is resolved here;
/// an unknown name fails the build instead of the first call.
pub fn compile(
    tree: DispatchTree,
    types: &TypeRegistry,
    conversions: &ConversionRegistry,
) -> Result<CompiledRoutine, DispatchError> {
    let max_params = tree.max_params();
    let compiler = Compiler { types, conversions };

    let mut groups = Vec::with_capacity(tree.groups().len());
    let mut outlines = Vec::with_capacity(tree.groups().len());
    for (arity, node) in tree.into_groups() {
        let (matcher, outline) = compiler.node(&node, 0, arity)?;
        groups.push((arity, matcher));
        outlines.push((arity, outline));
    }

    Ok(CompiledRoutine {
        groups,
        max_params,
        diagnostics: Diagnostics::new(outlines, types),
    })
}

struct Compiler<'a> {
    types: &'a TypeRegistry,
    conversions: &'a ConversionRegistry,
}

impl Compiler<'_> {
    fn node(
        &self,
        node: &DispatchNode,
        depth: usize,
        arity: Arity,
    ) -> Result<(Matcher, Outline), DispatchError> {
        match node {
            DispatchNode::Leaf(leaf) => {
                Ok((leaf_matcher(leaf.implementation.clone()), Outline::Leaf))
            }
            DispatchNode::Branch(children) => {
                let ordered = self.ordered(children);
                match arity {
                    Arity::AtLeast(n) if depth + 1 == n => self.rest_branch(&ordered, depth),
                    _ => self.branch(&ordered, depth, arity),
                }
            }
        }
    }

    /// Children sorted for testing: ordinary, catch-all, wildcard.
    ///
    /// A union key sorts with its least specific alternative.
    fn ordered<'n>(&self, children: &'n [(String, DispatchNode)]) -> Vec<&'n (String, DispatchNode)> {
        let mut ordered: Vec<_> = children.iter().collect();
        ordered.sort_by_key(|(name, _)| {
            alternatives(name)
                .map(|alt| self.types.order_key(alt))
                .max()
                .unwrap_or(0)
        });
        ordered
    }

    fn wire(&self, names: &[&str]) -> Result<Vec<(String, WiredConversion)>, DispatchError> {
        self.conversions
            .applicable(names)
            .into_iter()
            .map(|conversion| {
                Ok((
                    conversion.to.clone(),
                    WiredConversion {
                        from: self.types.lookup(&conversion.from)?,
                        convert: Arc::clone(&conversion.convert),
                        to: self.types.lookup(&conversion.to)?,
                    },
                ))
            })
            .collect()
    }

    fn branch(
        &self,
        ordered: &[&(String, DispatchNode)],
        depth: usize,
        arity: Arity,
    ) -> Result<(Matcher, Outline), DispatchError> {
        let mut direct: Vec<(TypeTest, Matcher)> = Vec::with_capacity(ordered.len());
        let mut outline: Vec<(String, TypeTest, Outline)> = Vec::with_capacity(ordered.len());
        for (name, child) in ordered {
            let test = self.types.lookup(name)?;
            let (matcher, child_outline) = self.node(child, depth + 1, arity)?;
            direct.push((test.clone(), matcher));
            outline.push((name.clone(), test, child_outline));
        }

        let names: Vec<&str> = ordered.iter().map(|(name, _)| name.as_str()).collect();
        let mut converted: Vec<(WiredConversion, Matcher)> = Vec::new();
        let mut outline_converted: Vec<(WiredConversion, usize)> = Vec::new();
        for (target, conversion) in self.wire(&names)? {
            // Reuse the subtree already compiled for the target type.
            if let Some(index) = names.iter().position(|name| *name == target) {
                converted.push((conversion.clone(), Arc::clone(&direct[index].1)));
                outline_converted.push((conversion, index));
            }
        }

        let matcher: Matcher = Arc::new(move |args: &[Value], acc: &mut Vec<Value>| {
            let arg = args.get(depth)?;
            for (test, child) in &direct {
                if test(arg) {
                    acc.push(arg.clone());
                    if let Some(result) = child(args, acc) {
                        return Some(result);
                    }
                    acc.pop();
                }
            }
            for (conversion, child) in &converted {
                if let Some(value) = conversion.apply(arg) {
                    acc.push(value);
                    if let Some(result) = child(args, acc) {
                        return Some(result);
                    }
                    acc.pop();
                }
            }
            None
        });
        let outline = Outline::Branch {
            depth,
            direct: outline,
            converted: outline_converted,
        };
        Ok((matcher, outline))
    }

    fn rest_branch(
        &self,
        ordered: &[&(String, DispatchNode)],
        depth: usize,
    ) -> Result<(Matcher, Outline), DispatchError> {
        let names: Vec<&str> = ordered
            .iter()
            .flat_map(|(name, _)| alternatives(name))
            .collect();
        let wired = self.wire(&names)?;

        let mut arms: Vec<RestArm> = Vec::with_capacity(ordered.len());
        for (key, child) in ordered {
            let DispatchNode::Leaf(leaf) = child else {
                continue;
            };
            let choices = alternatives(key)
                .map(|name| {
                    Ok(RestAlternative {
                        name: name.to_string(),
                        test: self.types.lookup(name)?,
                        conversions: wired
                            .iter()
                            .filter(|(target, _)| target == name)
                            .map(|(_, conversion)| conversion.clone())
                            .collect(),
                    })
                })
                .collect::<Result<Vec<_>, DispatchError>>()?;
            arms.push(RestArm {
                alternatives: choices,
                implementation: leaf.implementation.clone(),
            });
        }
        let arms: Arc<[RestArm]> = arms.into();

        let outline = Outline::Rest {
            depth,
            arms: Arc::clone(&arms),
        };
        let matcher: Matcher = Arc::new(move |args: &[Value], acc: &mut Vec<Value>| {
            let rest = args.get(depth..).filter(|rest| !rest.is_empty())?;
            arms.iter().find_map(|arm| {
                let collected = arm.collect(rest)?;
                acc.push(Value::array(collected));
                let result = arm.implementation.call(acc);
                acc.pop();
                Some(result)
            })
        });
        Ok((matcher, outline))
    }
}

/// One alternative of a variadic union, with the conversions wired to it.
struct RestAlternative {
    name: String,
    test: TypeTest,
    conversions: Vec<WiredConversion>,
}

/// One variadic union slot for the rest arguments of a variadic group.
struct RestArm {
    alternatives: Vec<RestAlternative>,
    implementation: Implementation,
}

impl RestArm {
    /// `arg` as one of the alternatives takes it: unchanged if any accepts it
    /// directly, otherwise through the first wired conversion that applies.
    fn accept(&self, arg: &Value) -> Option<Value> {
        if self.alternatives.iter().any(|alt| (alt.test)(arg)) {
            return Some(arg.clone());
        }
        self.alternatives
            .iter()
            .flat_map(|alt| &alt.conversions)
            .find_map(|conversion| conversion.apply(arg))
    }

    /// Every rest argument, converted where needed, or `None` if one is rejected.
    fn collect(&self, rest: &[Value]) -> Option<Vec<Value>> {
        rest.iter().map(|arg| self.accept(arg)).collect()
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.alternatives.iter().map(|alt| alt.name.as_str())
    }
}

fn leaf_matcher(implementation: Implementation) -> Matcher {
    Arc::new(move |_args: &[Value], acc: &mut Vec<Value>| Some(implementation.call(acc)))
}
