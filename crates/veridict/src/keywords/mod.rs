//! The polymorphic keyword model
//!
//! Every JSON Schema keyword is an independent validator. Construction from
//! raw JSON happens through the constructor registered in the keyword
//! registry; the trait then covers registration (ids/anchors), resolution
//! (pointer descent for `$ref` targets), and validation.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::fmt::Debug;

use serde_json::Value;

use crate::context::ValidationContext;
use crate::error::{KeyError, Result};
use crate::pointer::Pointer;
use crate::schema::Schema;
use crate::schema_registry::SchemaRegistry;

pub mod array;
pub mod boolean;
pub mod conditional;
pub mod core;
pub mod format;
pub mod numeric;
pub mod object;
pub mod refs;
pub mod standard;
pub mod string;

/// The uniform keyword contract.
pub trait Keyword: Debug + Send + Sync {
    /// Register ids and anchors of any carried subschemas. Most keywords
    /// have nothing to register.
    fn register(&self, _uri: &str, _registry: &SchemaRegistry) {}

    /// Descend into a named child for `$ref` resolution. Scalar keywords
    /// have no children.
    fn resolve(&self, _pointer: &Pointer, _uri: &str) -> Option<Schema> {
        None
    }

    /// Check the context's instance, appending failures to `errs`.
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>);
}

/// Constructor signature stored in the keyword registry: parse the keyword's
/// raw JSON value into a boxed keyword, or fail the schema parse.
pub type KeywordCtor = fn(&Value) -> Result<Box<dyn Keyword>>;

/// Append a validation error at the context's current instance location.
pub(crate) fn add_error(
    ctx: &ValidationContext<'_>,
    errs: &mut Vec<KeyError>,
    message: impl Into<String>,
) {
    let keyword_location = ctx.relative_location.to_string();
    errs.push(KeyError {
        instance_location: ctx.instance_location.to_string(),
        keyword_location: (!keyword_location.is_empty()).then_some(keyword_location),
        invalid_value: Some(ctx.instance.clone()),
        message: message.into(),
    });
}
