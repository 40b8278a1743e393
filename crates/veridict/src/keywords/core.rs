//! Core keywords: identifiers, anchors, definitions, and annotations
//!
//! These carry structure for URI resolution and fragment addressing but
//! assert nothing about instances at validation time.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::collections::BTreeMap;

use serde_json::Value;

use crate::context::ValidationContext;
use crate::error::{KeyError, Result, SchemaError};
use crate::keywords::Keyword;
use crate::pointer::Pointer;
use crate::schema::Schema;
use crate::schema_registry::SchemaRegistry;

fn expect_string(keyword: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SchemaError::keyword(keyword, "must be a string"))
}

/// `$schema` — meta-schema identifier, no validation behavior.
#[derive(Debug)]
pub struct SchemaUri(#[allow(dead_code)] String);

pub fn new_schema_uri(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(SchemaUri(expect_string("$schema", value)?)))
}

impl Keyword for SchemaUri {
    fn validate(&self, _ctx: &mut ValidationContext<'_>, _errs: &mut Vec<KeyError>) {}
}

/// `$id` — participates in URI resolution; captured on the schema object
/// at parse time, so the keyword itself is inert.
#[derive(Debug)]
pub struct Id(#[allow(dead_code)] String);

pub fn new_id(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Id(expect_string("$id", value)?)))
}

impl Keyword for Id {
    fn validate(&self, _ctx: &mut ValidationContext<'_>, _errs: &mut Vec<KeyError>) {}
}

/// `$anchor` — names an addressable fragment; registration happens through
/// the owning schema object.
#[derive(Debug)]
pub struct Anchor(#[allow(dead_code)] String);

pub fn new_anchor(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Anchor(expect_string("$anchor", value)?)))
}

impl Keyword for Anchor {
    fn validate(&self, _ctx: &mut ValidationContext<'_>, _errs: &mut Vec<KeyError>) {}
}

/// `$recursiveAnchor` — marks the schema as a dynamic resolution target.
#[derive(Debug)]
pub struct RecursiveAnchor(bool);

pub fn new_recursive_anchor(value: &Value) -> Result<Box<dyn Keyword>> {
    let flag = value
        .as_bool()
        .ok_or_else(|| SchemaError::keyword("$recursiveAnchor", "must be a boolean"))?;
    Ok(Box::new(RecursiveAnchor(flag)))
}

impl Keyword for RecursiveAnchor {
    fn validate(&self, ctx: &mut ValidationContext<'_>, _errs: &mut Vec<KeyError>) {
        if self.0 && ctx.recursive_anchor.is_none() {
            ctx.recursive_anchor = ctx.local.clone();
        }
    }
}

/// `$defs` — a bucket of reusable subschemas, registered recursively so
/// fragments can address them.
#[derive(Debug)]
pub struct Defs(BTreeMap<String, Schema>);

pub fn new_defs(value: &Value) -> Result<Box<dyn Keyword>> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::keyword("$defs", "must be an object"))?;
    let mut defs = BTreeMap::new();
    for (name, raw) in obj {
        defs.insert(name.clone(), Schema::parse(raw)?);
    }
    Ok(Box::new(Defs(defs)))
}

impl Keyword for Defs {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        for schema in self.0.values() {
            schema.register(uri, registry);
        }
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        let head = pointer.head()?;
        self.0.get(head)?.resolve(&pointer.tail(), uri)
    }

    fn validate(&self, _ctx: &mut ValidationContext<'_>, _errs: &mut Vec<KeyError>) {}
}

/// Annotation keywords with no structural role. One type covers `title`,
/// `description`, `$comment`, `examples`, `default`, `readOnly`, and
/// `writeOnly`; each keeps its raw value for round-tripping.
#[derive(Debug)]
pub struct Annotation {
    #[allow(dead_code)]
    value: Value,
}

impl Keyword for Annotation {
    fn validate(&self, _ctx: &mut ValidationContext<'_>, _errs: &mut Vec<KeyError>) {}
}

fn new_annotation(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Annotation {
        value: value.clone(),
    }))
}

pub fn new_title(value: &Value) -> Result<Box<dyn Keyword>> {
    expect_string("title", value)?;
    new_annotation(value)
}

pub fn new_description(value: &Value) -> Result<Box<dyn Keyword>> {
    expect_string("description", value)?;
    new_annotation(value)
}

pub fn new_comment(value: &Value) -> Result<Box<dyn Keyword>> {
    expect_string("$comment", value)?;
    new_annotation(value)
}

pub fn new_examples(value: &Value) -> Result<Box<dyn Keyword>> {
    if !value.is_array() {
        return Err(SchemaError::keyword("examples", "must be an array"));
    }
    new_annotation(value)
}

pub fn new_default(value: &Value) -> Result<Box<dyn Keyword>> {
    new_annotation(value)
}

pub fn new_read_only(value: &Value) -> Result<Box<dyn Keyword>> {
    if !value.is_boolean() {
        return Err(SchemaError::keyword("readOnly", "must be a boolean"));
    }
    new_annotation(value)
}

pub fn new_write_only(value: &Value) -> Result<Box<dyn Keyword>> {
    if !value.is_boolean() {
        return Err(SchemaError::keyword("writeOnly", "must be a boolean"));
    }
    new_annotation(value)
}
