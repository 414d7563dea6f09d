//! Error types for dispatcher construction and dispatch.
//!
//! Construction-time errors (`Syntax`, `DuplicateSignature`, `UnknownType`, ...)
//! are fatal to the `build` call that raised them. Call-time errors
//! (`WrongArgumentCount`, `WrongSignature`) are returned from `Dispatcher::call`.
//!
//! Factory functions (e.g. `unknown_type()`) are the preferred way to create
//! errors; they keep message formatting in one place.

use thiserror::Error;
use typed_value::Value;

/// Result of invoking a dispatcher or an implementation.
pub type DispatchResult = Result<Value, DispatchError>;

/// Every failure the engine can report.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    // Construction
    /// Malformed signature text, or a misplaced variadic marker.
    #[error("syntax error in signature `{signature}`: {message}")]
    Syntax { signature: String, message: String },

    /// Two concrete signatures with identical type lists.
    #[error("signature `{signature}` is defined twice")]
    DuplicateSignature { signature: String },

    /// A type name registered twice.
    #[error("type `{name}` is already registered")]
    DuplicateType { name: String },

    /// A type name that cannot be registered.
    #[error("invalid type name `{name}`: {reason}")]
    InvalidTypeName { name: String, reason: String },

    /// A signature or conversion references an unregistered type.
    #[error("unknown type `{}`{}", .name, suggestion_suffix(.suggestion))]
    UnknownType {
        name: String,
        suggestion: Option<String>,
    },

    /// Merged dispatchers carry different names.
    #[error("function names do not match: `{first}` and `{second}`")]
    NameConflict { first: String, second: String },

    // Dispatch
    /// The call arity matches no signature group.
    #[error("{}: wrong number of arguments (expected {}, got {})", display_name(.function), .expected, .got)]
    WrongArgumentCount {
        function: Option<String>,
        got: usize,
        expected: String,
    },

    /// The call arity matches, but no type path (including conversions) does.
    #[error(
        "{}: wrong signature, unexpected type of argument {} (expected: {}, actual: {})",
        display_name(.function),
        .index,
        .expected.join(" or "),
        .actual
    )]
    WrongSignature {
        function: Option<String>,
        index: usize,
        actual: String,
        expected: Vec<String>,
    },

    // Lookup
    /// `find` was asked for a signature the dispatcher does not have.
    #[error("{}: signature `{}` not found", display_name(.function), .signature)]
    SignatureNotFound {
        function: Option<String>,
        signature: String,
    },

    /// `convert` found neither a direct match nor a usable conversion.
    #[error("cannot convert {actual} to {target}")]
    CannotConvert { actual: String, target: String },

    // Implementation
    /// Raised by user implementations.
    #[error("{message}")]
    Custom { message: String },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!("; did you mean `{s}`?"),
        None => String::new(),
    }
}

fn display_name(function: &Option<String>) -> &str {
    match function.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => "function",
    }
}

impl DispatchError {
    /// Create an error from an implementation.
    #[cold]
    pub fn custom(message: impl Into<String>) -> Self {
        DispatchError::Custom {
            message: message.into(),
        }
    }

    /// Whether this error means "no signature accepted the call".
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            DispatchError::WrongArgumentCount { .. } | DispatchError::WrongSignature { .. }
        )
    }

    /// Whether this error can only arise while building a dispatcher.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            DispatchError::Syntax { .. }
                | DispatchError::DuplicateSignature { .. }
                | DispatchError::DuplicateType { .. }
                | DispatchError::InvalidTypeName { .. }
                | DispatchError::UnknownType { .. }
                | DispatchError::NameConflict { .. }
        )
    }
}

// Factory functions

#[cold]
pub fn syntax_error(signature: &str, message: impl Into<String>) -> DispatchError {
    DispatchError::Syntax {
        signature: signature.to_string(),
        message: message.into(),
    }
}

#[cold]
pub fn duplicate_signature(signature: impl Into<String>) -> DispatchError {
    DispatchError::DuplicateSignature {
        signature: signature.into(),
    }
}

#[cold]
pub fn duplicate_type(name: &str) -> DispatchError {
    DispatchError::DuplicateType {
        name: name.to_string(),
    }
}

#[cold]
pub fn invalid_type_name(name: &str, reason: impl Into<String>) -> DispatchError {
    DispatchError::InvalidTypeName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

#[cold]
pub fn unknown_type(name: &str, suggestion: Option<&str>) -> DispatchError {
    DispatchError::UnknownType {
        name: name.to_string(),
        suggestion: suggestion.map(str::to_string),
    }
}

#[cold]
pub fn name_conflict(first: &str, second: &str) -> DispatchError {
    DispatchError::NameConflict {
        first: first.to_string(),
        second: second.to_string(),
    }
}

#[cold]
pub fn wrong_argument_count(
    function: Option<&str>,
    got: usize,
    expected: impl Into<String>,
) -> DispatchError {
    DispatchError::WrongArgumentCount {
        function: function.map(str::to_string),
        got,
        expected: expected.into(),
    }
}

#[cold]
pub fn wrong_signature(
    function: Option<&str>,
    index: usize,
    actual: &str,
    expected: Vec<String>,
) -> DispatchError {
    DispatchError::WrongSignature {
        function: function.map(str::to_string),
        index,
        actual: actual.to_string(),
        expected,
    }
}

#[cold]
pub fn signature_not_found(function: Option<&str>, signature: &str) -> DispatchError {
    DispatchError::SignatureNotFound {
        function: function.map(str::to_string),
        signature: signature.to_string(),
    }
}

#[cold]
pub fn cannot_convert(actual: &str, target: &str) -> DispatchError {
    DispatchError::CannotConvert {
        actual: actual.to_string(),
        target: target.to_string(),
    }
}
