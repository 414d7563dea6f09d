//! Implementations, signature maps, and the compiled `Dispatcher`.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use typed_value::Value;

use crate::compile::CompiledRoutine;
use crate::errors::{duplicate_signature, DispatchError, DispatchResult};
use crate::tree::Arity;

/// Signature of an implementation body.
pub type ImplFn = dyn Fn(&[Value]) -> DispatchResult + Send + Sync;

/// Called instead of raising a mismatch error, with the dispatcher name, the
/// call arguments and the error that would have been raised.
pub type MismatchHandler =
    Arc<dyn Fn(Option<&str>, &[Value], DispatchError) -> DispatchResult + Send + Sync>;

/// A shared, callable implementation.
///
/// Identity matters: merging dispatchers accepts the same signature twice only
/// when both entries are the same implementation (`Implementation::ptr_eq`).
#[derive(Clone)]
pub struct Implementation(Arc<ImplFn>);

impl Implementation {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> DispatchResult + Send + Sync + 'static,
    {
        Implementation(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, args: &[Value]) -> DispatchResult {
        (self.0)(args)
    }

    /// Whether both handles refer to the same implementation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Implementation({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}

impl From<Dispatcher> for Implementation {
    fn from(dispatcher: Dispatcher) -> Self {
        dispatcher.implementation()
    }
}

/// Normalized signature text -> implementation, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct SignatureMap {
    entries: Vec<(String, Implementation)>,
    /// Key -> index into `entries`.
    index: FxHashMap<String, usize>,
}

impl SignatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, signature: &str) -> Option<&Implementation> {
        self.index
            .get(signature)
            .map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, signature: &str) -> bool {
        self.index.contains_key(signature)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Implementation)> {
        self.entries
            .iter()
            .map(|(key, implementation)| (key.as_str(), implementation))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an entry. Re-adding the same implementation under the same key is a
    /// no-op; a different implementation is a duplicate signature.
    pub(crate) fn insert(
        &mut self,
        key: String,
        implementation: Implementation,
    ) -> Result<(), DispatchError> {
        match self.get(&key) {
            Some(existing) if Implementation::ptr_eq(existing, &implementation) => Ok(()),
            Some(_) => Err(duplicate_signature(key)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, implementation));
                Ok(())
            }
        }
    }
}

struct DispatcherInner {
    name: Option<String>,
    signatures: SignatureMap,
    routine: CompiledRoutine,
    on_mismatch: Option<MismatchHandler>,
}

/// A compiled multiple-dispatch function.
///
/// Immutable after construction and cheap to clone; safe to call from
/// several threads at once.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub(crate) fn new(
        name: Option<String>,
        signatures: SignatureMap,
        routine: CompiledRoutine,
        on_mismatch: Option<MismatchHandler>,
    ) -> Self {
        Dispatcher {
            inner: Arc::new(DispatcherInner {
                name,
                signatures,
                routine,
                on_mismatch,
            }),
        }
    }

    /// Route the call to the implementation matching the arguments' types.
    pub fn call(&self, args: &[Value]) -> DispatchResult {
        let name = self.name();
        match self.inner.routine.invoke(name, args) {
            Ok(result) => result,
            Err(err) => match &self.inner.on_mismatch {
                Some(handler) => handler(name, args, err),
                None => Err(err),
            },
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Normalized signatures this dispatcher was built from.
    pub fn signatures(&self) -> &SignatureMap {
        &self.inner.signatures
    }

    /// Argument-count groups, in the order calls try them.
    pub fn arities(&self) -> Vec<Arity> {
        self.inner.routine.arities().collect()
    }

    /// Largest declared parameter count.
    pub fn max_params(&self) -> usize {
        self.inner.routine.max_params()
    }

    /// Wrap this dispatcher as an implementation of another one.
    pub fn implementation(&self) -> Implementation {
        let dispatcher = self.clone();
        Implementation::new(move |args| dispatcher.call(args))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.inner.name)
            .field("signatures", &self.inner.signatures.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
