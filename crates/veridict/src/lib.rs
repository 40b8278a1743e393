//! Veridict - JSON Schema validation for draft 2019-09
//!
//! Veridict compiles a JSON Schema document into an ordered collection of
//! pluggable keyword validators and evaluates instances against it,
//! producing a flat list of errors with structured locations.
//!
//! # Main Components
//!
//! - **Keyword registry**: process-wide keyword name → constructor mapping
//!   with deterministic evaluation ordering, extensible via
//!   [`register_keyword`]
//! - **Schema**: parse, register, resolve, and validate; boolean and object
//!   schemas with `$ref`/`$recursiveRef` graphs
//! - **Schema registry**: canonical-URI and per-root lookup with pluggable
//!   loaders for remote documents
//! - **Validation context**: annotation propagation for
//!   `unevaluatedProperties`, `unevaluatedItems`, and friends
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use veridict::{AppContext, Schema};
//!
//! let schema = Schema::parse(&json!({
//!     "type": "object",
//!     "properties": {"port": {"type": "integer", "minimum": 1}},
//!     "required": ["port"]
//! })).unwrap();
//!
//! let app = AppContext::new();
//! let state = schema.validate(&app, &json!({"port": 8080})).unwrap();
//! assert!(state.is_valid());
//!
//! let state = schema.validate(&app, &json!({})).unwrap();
//! assert_eq!(state.errs[0].message, "\"port\" value is required");
//! ```
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

pub mod context;
pub mod equality;
pub mod error;
pub mod keywords;
pub mod loader;
pub mod pointer;
pub mod registry;
pub mod schema;
pub mod schema_registry;
pub mod uri;

pub use context::AppContext;
pub use error::{
    invalid_value_string, set_max_error_value_len, KeyError, Result, SchemaError, ValidationState,
};
pub use keywords::{Keyword, KeywordCtor};
pub use loader::{register_loader, LoaderRegistry, SchemaLoader};
pub use pointer::Pointer;
pub use registry::{load_draft_2019_09, register_keyword, set_keyword_order};
pub use schema::Schema;
pub use schema_registry::SchemaRegistry;

use std::sync::OnceLock;

/// Parse schema bytes into a [`Schema`].
pub fn parse(bytes: &[u8]) -> Result<Schema> {
    Schema::parse_bytes(bytes)
}

fn debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("JSON_SCHEMA_DEBUG")
            .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
            .unwrap_or(false)
    })
}

/// Emit a dispatch trace line to stderr when `JSON_SCHEMA_DEBUG` is set.
pub(crate) fn schema_debug(message: &str) {
    tracing::trace!(target: "veridict", "{message}");
    if debug_enabled() {
        eprintln!("{message}");
    }
}
