//! Runtime values for typed dispatch.
//!
//! # Arc Enforcement
//!
//! All heap allocations go through factory methods on `Value`:
//!
//! ```text
//! let s = Value::string("hello");                          // OK
//! let xs = Value::array(vec![Value::number(1.0)]);         // OK
//! let s = Value::Str(Heap::new("hello".into()));           // ERROR: Heap::new is pub(super)
//! ```
//!
//! # Thread Safety
//!
//! Heap variants share their payload through `Arc`, so `Value` is
//! `Send + Sync` and cheap to clone. Compiled dispatchers rely on this to
//! be callable from several threads at once.

mod heap;

use std::collections::BTreeMap;
use std::fmt;

pub use heap::Heap;

/// String-keyed map backing `Value::Object`.
///
/// `BTreeMap` keeps `Display` output deterministic.
pub type ObjectMap = BTreeMap<String, Value>;

/// Dynamically typed runtime value.
#[derive(Clone)]
pub enum Value {
    // Primitives (inline, no heap allocation)
    /// Absent value.
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Floating-point number.
    Number(f64),

    // Heap Types (use Heap<T> for enforced Arc usage)
    /// String value.
    Str(Heap<String>),
    /// Ordered list of values.
    Array(Heap<Vec<Value>>),
    /// String-keyed record.
    Object(Heap<ObjectMap>),
}

// Factory Methods (ONLY way to construct heap values)

impl Value {
    /// Create a number value.
    #[inline]
    pub fn number(n: impl Into<f64>) -> Self {
        Value::Number(n.into())
    }

    /// Create a string value.
    ///
    /// ```text
    /// let s = Value::string("hello");
    /// let s2 = Value::string(format!("value: {x}"));
    /// ```
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    /// Create an array value.
    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Heap::new(items))
    }

    /// Create an object value.
    #[inline]
    pub fn object(entries: ObjectMap) -> Self {
        Value::Object(Heap::new(entries))
    }

    /// Create an object value from `(key, value)` pairs.
    pub fn object_from<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// Value Methods

impl Value {
    /// Stable name of the value's shape, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({:?})", s.as_str()),
            Value::Array(items) => f.debug_tuple("Array").field(&items.as_slice()).finish(),
            Value::Object(map) => f.debug_tuple("Object").field(&**map).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "\"{}\"", s.as_str()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

#[cfg(test)]
mod tests;
