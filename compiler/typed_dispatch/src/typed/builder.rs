//! `TypedBuilder` for creating engine instances with various configurations.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use typed_value::Value;

use super::Typed;
use crate::conversions::{Conversion, ConversionRegistry};
use crate::dispatcher::MismatchHandler;
use crate::errors::{DispatchError, DispatchResult};
use crate::types::{TypeDef, TypeRegistry};

/// Builder for `Typed` engines.
///
/// Types are registered before conversions, each in the order given, so a
/// conversion may refer to a type added on the same builder.
pub struct TypedBuilder {
    builtins: bool,
    types: Vec<(TypeDef, bool)>,
    conversions: Vec<Conversion>,
    ignored: FxHashSet<String>,
    on_mismatch: Option<MismatchHandler>,
}

impl TypedBuilder {
    /// Create a builder that starts from the built-in types.
    pub fn new() -> Self {
        TypedBuilder {
            builtins: true,
            types: Vec::new(),
            conversions: Vec::new(),
            ignored: FxHashSet::default(),
            on_mismatch: None,
        }
    }

    /// Start from the built-in types (`true`, the default) or from an empty registry.
    #[must_use]
    pub fn builtins(mut self, enabled: bool) -> Self {
        self.builtins = enabled;
        self
    }

    /// Register a type after the existing ones.
    #[must_use]
    pub fn type_def(mut self, def: TypeDef) -> Self {
        self.types.push((def, false));
        self
    }

    /// Register a type ahead of the first catch-all type.
    #[must_use]
    pub fn type_def_before_catch_all(mut self, def: TypeDef) -> Self {
        self.types.push((def, true));
        self
    }

    #[must_use]
    pub fn conversion(mut self, conversion: Conversion) -> Self {
        self.conversions.push(conversion);
        self
    }

    /// Drop every signature that mentions `name`.
    #[must_use]
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored.insert(name.into());
        self
    }

    /// Handle calls no signature accepts instead of returning the error.
    #[must_use]
    pub fn on_mismatch<F>(mut self, handler: F) -> Self
    where
        F: Fn(Option<&str>, &[Value], DispatchError) -> DispatchResult + Send + Sync + 'static,
    {
        self.on_mismatch = Some(Arc::new(handler));
        self
    }

    /// Build the engine, validating every type and conversion.
    pub fn build(self) -> Result<Typed, DispatchError> {
        let mut types = if self.builtins {
            TypeRegistry::with_builtins()
        } else {
            TypeRegistry::new()
        };
        for (def, before_catch_all) in self.types {
            types.add_type(def, before_catch_all)?;
        }

        let mut conversions = ConversionRegistry::new();
        for conversion in self.conversions {
            conversions.register(conversion, &types)?;
        }

        Ok(Typed {
            types,
            conversions,
            ignored: self.ignored,
            on_mismatch: self.on_mismatch,
        })
    }
}

impl Default for TypedBuilder {
    fn default() -> Self {
        Self::new()
    }
}
