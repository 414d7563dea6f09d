//! Dispatch tree: all concrete signatures merged into one shared structure.
//!
//! The root is keyed by `Arity`. Below it, each level is keyed by the type
//! accepted at that argument position. Signatures with a common type prefix
//! share the nodes for that prefix, so the compiled dispatcher tests the
//! prefix once no matter how many implementations branch off after it.
//!
//! ```text
//! "number, number"  "number, string"  "string"
//!
//! Exact(1) ── string ── leaf
//! Exact(2) ── number ─┬ number ── leaf
//!                     └ string ── leaf
//! ```
//!
//! The tree is built once per `build` call, handed to the compiler, and
//! dropped once the dispatcher exists.

use std::fmt;

use crate::dispatcher::Implementation;
use crate::errors::{duplicate_signature, DispatchError};
use crate::signature::ConcreteSignature;

/// Argument counts accepted by a group of signatures.
///
/// The derived ordering puts every `Exact` group before every `AtLeast`
/// group, each ascending by count: the order the dispatcher tries them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// `n` or more arguments; the last slot is variadic.
    AtLeast(usize),
}

impl Arity {
    /// Whether a call with `argc` arguments falls in this group.
    pub fn accepts(self, argc: usize) -> bool {
        match self {
            Arity::Exact(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
        }
    }

    /// Number of declared parameter slots.
    pub fn params(self) -> usize {
        match self {
            Arity::Exact(n) | Arity::AtLeast(n) => n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "{n} or more"),
        }
    }
}

/// A tree node: a branch keyed by type, or a leaf holding an implementation.
#[derive(Debug)]
pub enum DispatchNode {
    /// Children in encounter order.
    Branch(Vec<(String, DispatchNode)>),
    Leaf(Leaf),
}

/// Terminal node of one concrete signature.
#[derive(Debug)]
pub struct Leaf {
    pub implementation: Implementation,
    /// Full type path from the root.
    pub path: Vec<String>,
}

impl DispatchNode {
    fn empty() -> Self {
        DispatchNode::Branch(Vec::new())
    }

    /// Children of a branch; empty for a leaf.
    pub fn children(&self) -> &[(String, DispatchNode)] {
        match self {
            DispatchNode::Branch(children) => children,
            DispatchNode::Leaf(_) => &[],
        }
    }

    /// Child keyed by `ty`, if any.
    pub fn child(&self, ty: &str) -> Option<&DispatchNode> {
        self.children()
            .iter()
            .find(|(name, _)| name == ty)
            .map(|(_, node)| node)
    }

    /// Number of leaves below this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            DispatchNode::Branch(children) => {
                children.iter().map(|(_, child)| child.leaf_count()).sum()
            }
            DispatchNode::Leaf(_) => 1,
        }
    }

    /// Descend along `rest`, creating nodes as needed, and attach the leaf.
    fn insert(
        &mut self,
        rest: &[String],
        signature: &ConcreteSignature,
    ) -> Result<(), DispatchError> {
        let Some((head, tail)) = rest.split_first() else {
            if !matches!(self, DispatchNode::Branch(children) if children.is_empty()) {
                return Err(duplicate_signature(signature.key()));
            }
            *self = DispatchNode::Leaf(Leaf {
                implementation: signature.implementation().clone(),
                path: signature.types().to_vec(),
            });
            return Ok(());
        };

        let DispatchNode::Branch(children) = self else {
            return Err(duplicate_signature(signature.key()));
        };
        let position = match children.iter().position(|(name, _)| name == head) {
            Some(position) => position,
            None => {
                children.push((head.clone(), DispatchNode::empty()));
                children.len() - 1
            }
        };
        children[position].1.insert(tail, signature)
    }
}

/// The merged tree: one subtree per arity group, groups in dispatch order.
#[derive(Debug)]
pub struct DispatchTree {
    groups: Vec<(Arity, DispatchNode)>,
}

impl DispatchTree {
    /// Groups in the order the dispatcher tries them.
    pub fn groups(&self) -> &[(Arity, DispatchNode)] {
        &self.groups
    }

    /// Subtree for `arity`, if any signature has it.
    pub fn group(&self, arity: Arity) -> Option<&DispatchNode> {
        self.groups
            .iter()
            .find(|(a, _)| *a == arity)
            .map(|(_, node)| node)
    }

    /// Largest declared parameter count.
    pub fn max_params(&self) -> usize {
        self.groups
            .iter()
            .map(|(arity, _)| arity.params())
            .max()
            .unwrap_or(0)
    }

    pub fn into_groups(self) -> Vec<(Arity, DispatchNode)> {
        self.groups
    }
}

/// Merge concrete signatures into one tree.
///
/// Fails with `DuplicateSignature` when two signatures reach the same leaf.
pub fn build_tree(signatures: &[ConcreteSignature]) -> Result<DispatchTree, DispatchError> {
    let mut groups: Vec<(Arity, DispatchNode)> = Vec::new();
    for signature in signatures {
        let arity = signature.arity();
        let position = match groups.iter().position(|(a, _)| *a == arity) {
            Some(position) => position,
            None => {
                groups.push((arity, DispatchNode::empty()));
                groups.len() - 1
            }
        };
        groups[position].1.insert(signature.types(), signature)?;
    }
    groups.sort_by_key(|(arity, _)| *arity);

    tracing::trace!(
        groups = groups.len(),
        signatures = signatures.len(),
        "built dispatch tree"
    );
    Ok(DispatchTree { groups })
}
