//! Typed Dispatch - runtime multiple dispatch over `typed_value::Value`.
//!
//! A dispatcher is built from signatures such as `"number, string|boolean"`,
//! each bound to an implementation. At call time it inspects the runtime types
//! of the arguments and routes the call to the matching implementation,
//! applying registered conversions when no signature matches directly.
//!
//! # Pipeline
//!
//! - `signature`: parse signature text, expand unions into concrete signatures
//! - `tree`: merge concrete signatures into one tree keyed by arity, then type
//! - `compile`: turn the tree into a closure chain, once
//! - `dispatcher`: the callable result, cheap to clone and share across threads
//!
//! `types` and `conversions` hold the registries the compiler resolves names
//! against; `typed` ties everything together and `shared` provides the
//! process-wide default instance.
//!
//! ```text
//! let typed = Typed::new();
//! let add = typed.build(Some("add"), [Signatures::new()
//!     .with("number, number", |args| ...)
//!     .with("string, string", |args| ...)])?;
//! add.call(&[Value::number(1), Value::number(2)])?;
//! ```
//!
//! # Debug Environment Variables
//!
//! - `RUST_LOG=typed_dispatch=debug`: log type/conversion registration and
//!   every dispatcher build (after calling `init_tracing`).
//! - `RUST_LOG=typed_dispatch=trace`: also log conversion wiring and tree shape.

mod compile;
mod conversions;
mod dispatcher;
mod errors;
mod shared;
mod signature;
mod suggest;
mod tree;
mod typed;
mod types;

use std::sync::Once;

pub use compile::{compile, CompiledRoutine};
pub use conversions::{Conversion, ConversionRegistry, ConvertFn};
pub use dispatcher::{Dispatcher, ImplFn, Implementation, MismatchHandler, SignatureMap};
pub use errors::{DispatchError, DispatchResult};
pub use shared::{build, global, register_conversion, register_type, SharedTyped};
pub use signature::{
    normalize, ConcreteSignature, Param, Signature, ALTERNATIVE_SEPARATOR, VARIADIC_MARKER,
};
pub use suggest::{edit_distance, suggest_type_name};
pub use tree::{build_tree, Arity, DispatchNode, DispatchTree, Leaf};
pub use typed::{SignatureSource, Signatures, Typed, TypedBuilder};
pub use types::{TypeDef, TypeRegistry, TypeTest, WILDCARD};
pub use typed_value::Value;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debug output.
///
/// Call this at the start of tests or main to enable tracing.
/// Uses `RUST_LOG` environment variable for filtering.
///
/// Example: `RUST_LOG=typed_dispatch=debug cargo test`
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
