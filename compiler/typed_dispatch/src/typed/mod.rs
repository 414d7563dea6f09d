//! The engine instance: registries plus options, and the `build` entry point.
//!
//! `Typed` owns a `TypeRegistry` and a `ConversionRegistry` and turns signature
//! sources into compiled `Dispatcher`s:
//!
//! ```text
//! sources ─► SignatureMap ─► Signature::split ─► build_tree ─► compile ─► Dispatcher
//! ```
//!
//! Registries are read once per `build`; changing them afterwards does not
//! affect dispatchers that already exist.

mod builder;

use std::fmt;

use rustc_hash::FxHashSet;
use typed_value::Value;

use crate::compile::compile;
use crate::conversions::{Conversion, ConversionRegistry};
use crate::dispatcher::{Dispatcher, Implementation, MismatchHandler, SignatureMap};
use crate::errors::{
    cannot_convert, duplicate_signature, name_conflict, signature_not_found, DispatchError,
    DispatchResult,
};
use crate::signature::{normalize, ConcreteSignature, Signature};
use crate::tree::build_tree;
use crate::types::{TypeDef, TypeRegistry};

pub use builder::TypedBuilder;

/// Signature text -> implementation entries, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Signatures {
    entries: Vec<(String, Implementation)>,
}

impl Signatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature with a closure body.
    #[must_use]
    pub fn with<F>(self, spec: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> DispatchResult + Send + Sync + 'static,
    {
        self.with_implementation(spec, Implementation::new(f))
    }

    /// Add a signature with an existing implementation.
    #[must_use]
    pub fn with_implementation(
        mut self,
        spec: impl Into<String>,
        implementation: Implementation,
    ) -> Self {
        self.entries.push((spec.into(), implementation));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One input to `Typed::build`.
#[derive(Clone, Debug)]
pub enum SignatureSource {
    /// Raw signature text with implementations.
    Entries(Vec<(String, Implementation)>),
    /// A built dispatcher whose signatures are merged in.
    Dispatcher(Dispatcher),
}

impl From<Signatures> for SignatureSource {
    fn from(signatures: Signatures) -> Self {
        SignatureSource::Entries(signatures.entries)
    }
}

impl From<(&str, Implementation)> for SignatureSource {
    fn from((spec, implementation): (&str, Implementation)) -> Self {
        SignatureSource::Entries(vec![(spec.to_string(), implementation)])
    }
}

impl From<Dispatcher> for SignatureSource {
    fn from(dispatcher: Dispatcher) -> Self {
        SignatureSource::Dispatcher(dispatcher)
    }
}

impl From<&Dispatcher> for SignatureSource {
    fn from(dispatcher: &Dispatcher) -> Self {
        SignatureSource::Dispatcher(dispatcher.clone())
    }
}

/// A dispatch engine: type and conversion registries plus build options.
#[derive(Clone)]
pub struct Typed {
    types: TypeRegistry,
    conversions: ConversionRegistry,
    /// Concrete signatures mentioning one of these are dropped at build time.
    ignored: FxHashSet<String>,
    on_mismatch: Option<MismatchHandler>,
}

impl Typed {
    /// Engine with the built-in types, no conversions and default options.
    pub fn new() -> Self {
        Typed {
            types: TypeRegistry::with_builtins(),
            conversions: ConversionRegistry::new(),
            ignored: FxHashSet::default(),
            on_mismatch: None,
        }
    }

    pub fn builder() -> TypedBuilder {
        TypedBuilder::new()
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn conversions(&self) -> &ConversionRegistry {
        &self.conversions
    }

    /// Whether signatures mentioning `name` are dropped at build time.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    pub fn register_type(&mut self, def: TypeDef) -> Result<(), DispatchError> {
        self.types.register_type(def)
    }

    /// Register a type, optionally ahead of the catch-all `Object`.
    pub fn add_type(&mut self, def: TypeDef, before_catch_all: bool) -> Result<(), DispatchError> {
        self.types.add_type(def, before_catch_all)
    }

    pub fn register_conversion(&mut self, conversion: Conversion) -> Result<(), DispatchError> {
        self.conversions.register(conversion, &self.types)
    }

    pub fn clear_conversions(&mut self) {
        self.conversions.clear();
    }

    /// Name of the first registered type accepting `value`.
    pub fn type_of(&self, value: &Value) -> &str {
        self.types.type_of(value)
    }

    /// Build a dispatcher from one or more signature sources.
    ///
    /// `name` and the names of merged dispatchers must agree; when `name` is
    /// `None` the dispatcher takes the name of the merged dispatchers, if any.
    pub fn build<I, S>(&self, name: Option<&str>, sources: I) -> Result<Dispatcher, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<SignatureSource>,
    {
        let sources: Vec<SignatureSource> = sources.into_iter().map(Into::into).collect();
        let name = resolve_name(name, &sources)?;

        let mut signatures = SignatureMap::new();
        for source in &sources {
            match source {
                SignatureSource::Entries(entries) => {
                    for (spec, implementation) in entries {
                        signatures.insert(normalize(spec)?, implementation.clone())?;
                    }
                }
                SignatureSource::Dispatcher(dispatcher) => {
                    for (key, implementation) in dispatcher.signatures().iter() {
                        signatures.insert(key.to_string(), implementation.clone())?;
                    }
                }
            }
        }

        let concrete = self.expand(&signatures)?;
        let tree = build_tree(&concrete)?;
        let arity_groups = tree.groups().len();
        let routine = compile(tree, &self.types, &self.conversions)?;

        tracing::debug!(
            name = name.as_deref().unwrap_or("<anonymous>"),
            signatures = signatures.len(),
            concrete = concrete.len(),
            arity_groups,
            "built dispatcher"
        );
        Ok(Dispatcher::new(
            name,
            signatures,
            routine,
            self.on_mismatch.clone(),
        ))
    }

    /// Split every signature, drop ignored types, reject duplicates.
    fn expand(&self, signatures: &SignatureMap) -> Result<Vec<ConcreteSignature>, DispatchError> {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut concrete = Vec::new();
        for (key, implementation) in signatures.iter() {
            let signature = Signature::parse(key, implementation.clone())?;
            let Some(signature) = signature.retain_types(|t| !self.ignored.contains(t)) else {
                tracing::trace!(signature = %key, "dropped signature with only ignored types in a slot");
                continue;
            };
            for split in signature.split() {
                if !seen.insert(split.key()) {
                    return Err(duplicate_signature(split.key()));
                }
                concrete.push(split);
            }
        }
        Ok(concrete)
    }

    /// Implementation registered for exactly `signature` (after normalization).
    pub fn find(
        &self,
        dispatcher: &Dispatcher,
        signature: &str,
    ) -> Result<Implementation, DispatchError> {
        let key = normalize(signature)?;
        dispatcher
            .signatures()
            .get(&key)
            .cloned()
            .ok_or_else(|| signature_not_found(dispatcher.name(), &key))
    }

    /// Convert `value` to type `target`.
    ///
    /// A value already of type `target` is returned as is. Otherwise the first
    /// registered conversion into `target` that accepts the value and yields a
    /// value passing `target`'s test is applied.
    pub fn convert(&self, value: &Value, target: &str) -> DispatchResult {
        let test = self.types.lookup(target)?;
        if test(value) {
            return Ok(value.clone());
        }
        for conversion in self.conversions.targeting(target) {
            let from = self.types.lookup(&conversion.from)?;
            if !from(value) {
                continue;
            }
            let converted = (conversion.convert)(value);
            if test(&converted) {
                return Ok(converted);
            }
        }
        Err(cannot_convert(self.type_of(value), target))
    }
}

impl Default for Typed {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Typed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("types", &self.types)
            .field("conversions", &self.conversions)
            .field("ignored", &self.ignored)
            .field("on_mismatch", &self.on_mismatch.is_some())
            .finish()
    }
}

/// The explicit name and every merged dispatcher name must agree.
fn resolve_name(
    explicit: Option<&str>,
    sources: &[SignatureSource],
) -> Result<Option<String>, DispatchError> {
    let merged = sources.iter().filter_map(|source| match source {
        SignatureSource::Dispatcher(dispatcher) => dispatcher.name(),
        SignatureSource::Entries(_) => None,
    });

    let mut resolved: Option<&str> = None;
    for name in explicit.into_iter().chain(merged) {
        if name.is_empty() {
            continue;
        }
        match resolved {
            Some(first) if first != name => return Err(name_conflict(first, name)),
            Some(_) => {}
            None => resolved = Some(name),
        }
    }
    Ok(resolved.map(str::to_string))
}
