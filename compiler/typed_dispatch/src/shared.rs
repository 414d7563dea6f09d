//! Thread-safe shared engine and the process-wide default instance.
//!
//! Building takes a read lock, registration a write lock, so registry
//! mutation is serialized against in-flight builds. Built dispatchers hold no
//! reference to the engine and never lock.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::conversions::Conversion;
use crate::dispatcher::Dispatcher;
use crate::errors::DispatchError;
use crate::typed::{SignatureSource, Typed};
use crate::types::TypeDef;

/// Thread-safe mutable handle to a `Typed` engine.
pub struct SharedTyped(Arc<parking_lot::RwLock<Typed>>);

impl SharedTyped {
    pub fn new(typed: Typed) -> Self {
        SharedTyped(Arc::new(parking_lot::RwLock::new(typed)))
    }

    /// Get read access to the engine.
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, Typed> {
        self.0.read()
    }

    /// Get write access to the engine.
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, Typed> {
        self.0.write()
    }

    pub fn build<I, S>(&self, name: Option<&str>, sources: I) -> Result<Dispatcher, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<SignatureSource>,
    {
        self.read().build(name, sources)
    }

    pub fn register_type(&self, def: TypeDef) -> Result<(), DispatchError> {
        self.write().register_type(def)
    }

    pub fn register_conversion(&self, conversion: Conversion) -> Result<(), DispatchError> {
        self.write().register_conversion(conversion)
    }
}

impl Clone for SharedTyped {
    fn clone(&self) -> Self {
        SharedTyped(Arc::clone(&self.0))
    }
}

impl fmt::Debug for SharedTyped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedTyped({:?})", &*self.0.read())
    }
}

static GLOBAL: OnceLock<SharedTyped> = OnceLock::new();

/// The process-wide default engine, created with the built-in types on first use.
pub fn global() -> &'static SharedTyped {
    GLOBAL.get_or_init(|| SharedTyped::new(Typed::new()))
}

/// Build a dispatcher with the default engine.
pub fn build<I, S>(name: Option<&str>, sources: I) -> Result<Dispatcher, DispatchError>
where
    I: IntoIterator<Item = S>,
    S: Into<SignatureSource>,
{
    global().build(name, sources)
}

/// Register a type with the default engine.
pub fn register_type(def: TypeDef) -> Result<(), DispatchError> {
    global().register_type(def)
}

/// Register a conversion with the default engine.
pub fn register_conversion(conversion: Conversion) -> Result<(), DispatchError> {
    global().register_conversion(conversion)
}
