//! Registry of named runtime type predicates.
//!
//! A type is a name plus a predicate over `Value`. Signatures refer to types
//! by name; the dispatcher compiler resolves every name to its predicate once,
//! at build time.
//!
//! # Ordering
//!
//! Sibling types at one depth of a dispatch tree are tested in a fixed order:
//! ordinary types first (in encounter order), then catch-all types such as
//! `Object`, then the wildcard `*`. A value matching both a specific type and
//! a permissive one is therefore routed to the specific branch.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use typed_value::Value;

use crate::errors::{duplicate_type, invalid_type_name, unknown_type, DispatchError};
use crate::suggest::suggest_type_name;

/// Reserved name of the type that matches every value.
pub const WILDCARD: &str = "*";

/// Predicate deciding whether a value belongs to a type.
pub type TypeTest = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A named type predicate.
#[derive(Clone)]
pub struct TypeDef {
    pub name: String,
    pub test: TypeTest,
    /// Catch-all types sort after ordinary types among siblings.
    pub catch_all: bool,
}

impl TypeDef {
    pub fn new<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        TypeDef {
            name: name.into(),
            test: Arc::new(test),
            catch_all: false,
        }
    }

    /// Mark this type as a catch-all structural type.
    #[must_use]
    pub fn catch_all(mut self) -> Self {
        self.catch_all = true;
        self
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("catch_all", &self.catch_all)
            .finish_non_exhaustive()
    }
}

/// Registry of named type predicates, in registration order.
#[derive(Clone)]
pub struct TypeRegistry {
    types: Vec<TypeDef>,
    /// Name -> index into `types`.
    index: FxHashMap<String, usize>,
    wildcard: TypeTest,
}

impl TypeRegistry {
    /// Create an empty registry. Only `*` resolves.
    pub fn new() -> Self {
        TypeRegistry {
            types: Vec::new(),
            index: FxHashMap::default(),
            wildcard: Arc::new(|_: &Value| true),
        }
    }

    /// Create a registry holding the built-in types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for def in builtin_types() {
            registry.push(def);
        }
        registry
    }

    /// Register a type after all existing ones.
    pub fn register_type(&mut self, def: TypeDef) -> Result<(), DispatchError> {
        self.validate_new(&def.name)?;
        tracing::debug!(name = %def.name, catch_all = def.catch_all, "registered type");
        self.push(def);
        Ok(())
    }

    /// Register a type, optionally in front of the first catch-all type.
    ///
    /// Inserting before `Object` makes `type_of` report the new type for
    /// values that would otherwise fall through to the catch-all.
    pub fn add_type(&mut self, def: TypeDef, before_catch_all: bool) -> Result<(), DispatchError> {
        self.validate_new(&def.name)?;
        let position = if before_catch_all {
            self.types
                .iter()
                .position(|t| t.catch_all)
                .unwrap_or(self.types.len())
        } else {
            self.types.len()
        };
        tracing::debug!(name = %def.name, position, "added type");
        self.types.insert(position, def);
        self.reindex();
        Ok(())
    }

    /// Resolve a type name to its predicate.
    pub fn lookup(&self, name: &str) -> Result<TypeTest, DispatchError> {
        if name == WILDCARD {
            return Ok(Arc::clone(&self.wildcard));
        }
        match self.index.get(name) {
            Some(&i) => Ok(Arc::clone(&self.types[i].test)),
            None => Err(unknown_type(
                name,
                suggest_type_name(name, self.types.iter().map(|t| t.name.as_str())),
            )),
        }
    }

    /// Get a registered type definition. The wildcard has none.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    /// Whether `name` resolves (the wildcard always does).
    pub fn contains(&self, name: &str) -> bool {
        name == WILDCARD || self.index.contains_key(name)
    }

    /// Name of the first registered type accepting `value`.
    pub fn type_of(&self, value: &Value) -> &str {
        self.types
            .iter()
            .find(|t| (t.test)(value))
            .map_or("unknown", |t| t.name.as_str())
    }

    /// Sort key for sibling ordering: ordinary, then catch-all, then wildcard.
    pub fn order_key(&self, name: &str) -> u8 {
        if name == WILDCARD {
            2
        } else if self.get(name).is_some_and(|t| t.catch_all) {
            1
        } else {
            0
        }
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + Clone {
        self.types.iter().map(|t| t.name.as_str())
    }

    /// Registered definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn validate_new(&self, name: &str) -> Result<(), DispatchError> {
        validate_type_name(name)?;
        if self.index.contains_key(name) {
            return Err(duplicate_type(name));
        }
        Ok(())
    }

    fn push(&mut self, def: TypeDef) {
        self.index.insert(def.name.clone(), self.types.len());
        self.types.push(def);
    }

    fn reindex(&mut self) {
        self.index = self
            .types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Reject names that the signature grammar could not express.
pub(crate) fn validate_type_name(name: &str) -> Result<(), DispatchError> {
    if name == WILDCARD {
        return Err(invalid_type_name(name, "`*` is reserved for the wildcard type"));
    }
    if name.is_empty() {
        return Err(invalid_type_name(name, "type name is empty"));
    }
    if name.contains([',', '|']) || name.contains("...") || name.chars().any(char::is_whitespace)
    {
        return Err(invalid_type_name(
            name,
            "type name contains signature syntax (`,`, `|`, `...` or whitespace)",
        ));
    }
    Ok(())
}

/// The built-in types, in registration order.
fn builtin_types() -> Vec<TypeDef> {
    vec![
        TypeDef::new("number", |v| matches!(v, Value::Number(_))),
        TypeDef::new("string", |v| matches!(v, Value::Str(_))),
        TypeDef::new("boolean", |v| matches!(v, Value::Bool(_))),
        TypeDef::new("Array", |v| matches!(v, Value::Array(_))),
        TypeDef::new("null", Value::is_null),
        TypeDef::new("undefined", Value::is_undefined),
        TypeDef::new("Object", |v| matches!(v, Value::Object(_))).catch_all(),
    ]
}
