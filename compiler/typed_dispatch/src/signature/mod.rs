//! Signature model: parsing and union expansion.
//!
//! # Grammar
//!
//! ```text
//! signature := "" | slot ("," slot)*
//! slot      := ["..."] alts ["..."]
//! alts      := type ("|" type)*
//! ```
//!
//! Whitespace around slots and alternatives is ignored. The variadic marker
//! `...` may appear on the final slot only, as a suffix (`number...`) or a
//! prefix (`...number`). It applies to the whole slot.
//!
//! # Expansion
//!
//! `Signature::split` turns a signature with union slots into the cartesian
//! product of single-type `ConcreteSignature`s, the unit the tree builder works
//! with. `"number|string, boolean"` splits into `number,boolean` and
//! `string,boolean`.
//!
//! A variadic slot is not expanded: every rest argument is checked against the
//! whole union, so `"string, number|boolean..."` stays one concrete signature
//! whose last slot is `number|boolean`.

use std::fmt;

use smallvec::SmallVec;

use crate::dispatcher::Implementation;
use crate::errors::{syntax_error, DispatchError};
use crate::tree::Arity;

/// Marker for a trailing repeatable parameter.
pub const VARIADIC_MARKER: &str = "...";

/// Separator between the type alternatives of one slot.
pub const ALTERNATIVE_SEPARATOR: &str = "|";

/// Type names of one slot key (`"number|string"` -> `number`, `string`).
pub(crate) fn alternatives(slot: &str) -> impl Iterator<Item = &str> + Clone {
    slot.split(ALTERNATIVE_SEPARATOR)
}

/// One argument position: a set of alternative type names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    /// Unique alternatives, in declaration order.
    types: SmallVec<[String; 2]>,
    variadic: bool,
}

impl Param {
    /// Alternatives in declaration order.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Whether this slot has exactly one alternative.
    pub fn is_concrete(&self) -> bool {
        self.types.len() == 1
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.types.join(ALTERNATIVE_SEPARATOR))?;
        if self.variadic {
            write!(f, "{VARIADIC_MARKER}")?;
        }
        Ok(())
    }
}

/// An ordered parameter list bound to one implementation.
#[derive(Clone, Debug)]
pub struct Signature {
    params: Vec<Param>,
    implementation: Implementation,
}

impl Signature {
    /// Parse signature text such as `"number|string, boolean..."`.
    pub fn parse(spec: &str, implementation: Implementation) -> Result<Self, DispatchError> {
        Ok(Signature {
            params: parse_params(spec)?,
            implementation,
        })
    }

    /// Build from pre-split slots, each `"a|b"` with an optional variadic marker.
    pub fn from_slots(slots: &[&str], implementation: Implementation) -> Result<Self, DispatchError> {
        let spec = slots.join(",");
        let params = slots
            .iter()
            .map(|slot| parse_slot(slot, &spec))
            .collect::<Result<Vec<_>, _>>()?;
        check_variadic_position(&params, &spec)?;
        Ok(Signature {
            params,
            implementation,
        })
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Whether the last parameter is variadic.
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(Param::is_variadic)
    }

    /// Normalized text: slots joined by `,`, alternatives by `|`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Number of concrete signatures `split` produces.
    pub fn expansion_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| !p.variadic)
            .map(|p| p.types.len())
            .product()
    }

    /// Copy of this signature keeping only the alternatives `keep` accepts.
    ///
    /// `None` when some slot loses all of its alternatives.
    pub fn retain_types(&self, keep: impl Fn(&str) -> bool) -> Option<Signature> {
        let params = self
            .params
            .iter()
            .map(|param| {
                let types: SmallVec<[String; 2]> =
                    param.types.iter().filter(|t| keep(t.as_str())).cloned().collect();
                (!types.is_empty()).then_some(Param {
                    types,
                    variadic: param.variadic,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Signature {
            params,
            implementation: self.implementation.clone(),
        })
    }

    /// Expand fixed union slots into every single-type combination.
    ///
    /// Combinations follow declaration order, leftmost slot outermost. The
    /// variadic slot keeps its alternatives together as one slot key.
    pub fn split(&self) -> Vec<ConcreteSignature> {
        let mut combos: Vec<Vec<String>> = vec![Vec::with_capacity(self.params.len())];
        for param in &self.params {
            let rest_slot;
            let choices: &[String] = if param.variadic {
                rest_slot = [param.types.join(ALTERNATIVE_SEPARATOR)];
                &rest_slot
            } else {
                &param.types
            };
            let mut next = Vec::with_capacity(combos.len() * choices.len());
            for combo in &combos {
                for ty in choices {
                    let mut extended = combo.clone();
                    extended.push(ty.clone());
                    next.push(extended);
                }
            }
            combos = next;
        }

        let variadic = self.is_variadic();
        combos
            .into_iter()
            .map(|types| ConcreteSignature {
                types,
                variadic,
                implementation: self.implementation.clone(),
            })
            .collect()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{param}")?;
        }
        Ok(())
    }
}

/// A signature whose every fixed slot holds exactly one type.
///
/// The variadic slot, if any, holds its whole union (`"number|string"`).
#[derive(Clone, Debug)]
pub struct ConcreteSignature {
    types: Vec<String>,
    variadic: bool,
    implementation: Implementation,
}

impl ConcreteSignature {
    /// Slot keys; every slot but a variadic last one is a single type name.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Alternatives accepted for every rest argument.
    pub fn rest_types(&self) -> Option<impl Iterator<Item = &str> + Clone> {
        self.types
            .last()
            .filter(|_| self.variadic)
            .map(|slot| alternatives(slot))
    }

    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Argument counts this signature accepts.
    pub fn arity(&self) -> Arity {
        if self.variadic {
            Arity::AtLeast(self.types.len())
        } else {
            Arity::Exact(self.types.len())
        }
    }

    /// Identity used for duplicate detection.
    pub fn key(&self) -> String {
        let mut key = self.types.join(",");
        if self.variadic {
            key.push_str(VARIADIC_MARKER);
        }
        key
    }

    /// Whether any slot names `ty`.
    pub fn mentions(&self, ty: &str) -> bool {
        self.types
            .iter()
            .any(|slot| alternatives(slot).any(|t| t == ty))
    }
}

/// Normalize signature text without binding an implementation.
pub fn normalize(spec: &str) -> Result<String, DispatchError> {
    let params = parse_params(spec)?;
    Ok(params
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(","))
}

fn parse_params(spec: &str) -> Result<Vec<Param>, DispatchError> {
    if spec.trim().is_empty() {
        return Ok(Vec::new());
    }
    let params = spec
        .split(',')
        .map(|slot| parse_slot(slot, spec))
        .collect::<Result<Vec<_>, _>>()?;
    check_variadic_position(&params, spec)?;
    Ok(params)
}

fn parse_slot(slot: &str, spec: &str) -> Result<Param, DispatchError> {
    let mut body = slot.trim();
    if body.is_empty() {
        return Err(syntax_error(spec, "empty parameter"));
    }

    let mut variadic = false;
    if let Some(rest) = body.strip_prefix(VARIADIC_MARKER) {
        body = rest.trim_start();
        variadic = true;
    }
    if let Some(rest) = body.strip_suffix(VARIADIC_MARKER) {
        if variadic {
            return Err(syntax_error(spec, "variadic marker given twice"));
        }
        body = rest.trim_end();
        variadic = true;
    }

    let mut types: SmallVec<[String; 2]> = SmallVec::new();
    for alt in body.split(ALTERNATIVE_SEPARATOR) {
        let name = alt.trim();
        if name.is_empty() {
            return Err(syntax_error(spec, "empty type alternative"));
        }
        if name.contains(VARIADIC_MARKER) {
            return Err(syntax_error(
                spec,
                "variadic marker must trail the whole parameter",
            ));
        }
        if name.contains(',') || name.chars().any(char::is_whitespace) {
            return Err(syntax_error(spec, format!("malformed type name `{name}`")));
        }
        if !types.iter().any(|t| t == name) {
            types.push(name.to_string());
        }
    }

    Ok(Param { types, variadic })
}

fn check_variadic_position(params: &[Param], spec: &str) -> Result<(), DispatchError> {
    let last = params.len().saturating_sub(1);
    if params
        .iter()
        .enumerate()
        .any(|(i, p)| p.variadic && i != last)
    {
        return Err(syntax_error(
            spec,
            "variadic parameter must be the last parameter",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
