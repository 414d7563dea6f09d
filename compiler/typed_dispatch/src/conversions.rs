//! Ordered registry of type conversions.
//!
//! Conversions are a fallback: at each dispatch branch they are tried only
//! after every direct type test at that argument position has failed.
//! Registration order decides which conversion wins when several share a
//! source type.

use std::fmt;
use std::sync::Arc;

use typed_value::Value;

use crate::errors::{invalid_type_name, DispatchError};
use crate::types::{TypeRegistry, WILDCARD};

/// Transform applied to an argument to make it stand in for another type.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A rule letting a value of type `from` be used where `to` is expected.
#[derive(Clone)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub convert: ConvertFn,
}

impl Conversion {
    pub fn new<F>(from: impl Into<String>, to: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Conversion {
            from: from.into(),
            to: to.into(),
            convert: Arc::new(convert),
        }
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Conversion({} -> {})", self.from, self.to)
    }
}

/// Conversions in registration order.
#[derive(Clone, Debug, Default)]
pub struct ConversionRegistry {
    conversions: Vec<Conversion>,
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a conversion. Both endpoints must already be registered types.
    pub fn register(
        &mut self,
        conversion: Conversion,
        types: &TypeRegistry,
    ) -> Result<(), DispatchError> {
        for name in [&conversion.from, &conversion.to] {
            if name == WILDCARD {
                return Err(invalid_type_name(
                    name,
                    "the wildcard cannot take part in a conversion",
                ));
            }
            types.lookup(name)?;
        }
        tracing::debug!(from = %conversion.from, to = %conversion.to, "registered conversion");
        self.conversions.push(conversion);
        Ok(())
    }

    /// Conversions to wire into a branch whose children are `targets`.
    ///
    /// A conversion applies when its `to` is a child and its `from` is not.
    /// Only the first registered conversion per source type is returned; later
    /// ones for the same source are shadowed at this branch.
    pub fn applicable<'a>(&'a self, targets: &[&str]) -> Vec<&'a Conversion> {
        let mut wired: Vec<&Conversion> = Vec::new();
        for conversion in &self.conversions {
            if !targets.contains(&conversion.to.as_str())
                || targets.contains(&conversion.from.as_str())
            {
                continue;
            }
            if wired.iter().any(|w| w.from == conversion.from) {
                tracing::trace!(
                    from = %conversion.from,
                    to = %conversion.to,
                    "conversion shadowed by an earlier one from the same type"
                );
                continue;
            }
            tracing::trace!(from = %conversion.from, to = %conversion.to, "conversion wired");
            wired.push(conversion);
        }
        wired
    }

    /// Conversions targeting `to`, in registration order.
    pub fn targeting<'a>(&'a self, to: &'a str) -> impl Iterator<Item = &'a Conversion> + 'a {
        self.conversions.iter().filter(move |c| c.to == to)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conversion> {
        self.conversions.iter()
    }

    pub fn len(&self) -> usize {
        self.conversions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }

    /// Remove every conversion.
    pub fn clear(&mut self) {
        self.conversions.clear();
    }
}
