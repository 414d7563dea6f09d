//! Typed Value - runtime values for the typed dispatch engine.
//!
//! This crate provides the dynamically typed `Value` that dispatchers
//! inspect at call time. Type predicates, signatures and conversions all
//! operate on `Value`; the engine itself lives in `typed_dispatch`.
//!
//! # Heap Values
//!
//! Strings, arrays and objects are reference counted through `Heap<T>`.
//! `Heap` has no public constructor, so heap values are only created through
//! the `Value::` factory methods.

mod value;

pub use value::{Heap, ObjectMap, Value};
