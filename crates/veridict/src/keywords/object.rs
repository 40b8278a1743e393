//! Object keywords
//!
//! `properties` and `patternProperties` mark the names they match so
//! `additionalProperties` can skip them; the cross-keyword evaluated set,
//! which also accumulates combinator contributions, feeds
//! `unevaluatedProperties`.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;

use crate::context::ValidationContext;
use crate::error::{KeyError, Result, SchemaError};
use crate::keywords::{add_error, Keyword};
use crate::pointer::Pointer;
use crate::schema::Schema;
use crate::schema_registry::SchemaRegistry;

fn expect_non_negative_int(keyword: &str, value: &Value) -> Result<usize> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| SchemaError::keyword(keyword, "must be a non-negative integer"))
}

fn expect_string_array(keyword: &str, value: &Value) -> Result<Vec<String>> {
    let arr = value
        .as_array()
        .ok_or_else(|| SchemaError::keyword(keyword, "must be an array of strings"))?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| SchemaError::keyword(keyword, "must be an array of strings"))
        })
        .collect()
}

/// `properties` — validate each key present in both schema and instance.
#[derive(Debug)]
pub struct Properties(BTreeMap<String, Schema>);

pub fn new_properties(value: &Value) -> Result<Box<dyn Keyword>> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::keyword("properties", "must be an object"))?;
    let mut props = BTreeMap::new();
    for (key, raw) in obj {
        props.insert(key.clone(), Schema::parse(raw)?);
    }
    Ok(Box::new(Properties(props)))
}

impl Keyword for Properties {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        for schema in self.0.values() {
            schema.register(uri, registry);
        }
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        let head = pointer.head()?;
        self.0.get(head)?.resolve(&pointer.tail(), uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Object(obj) = ctx.instance else {
            return;
        };
        for (key, schema) in &self.0 {
            let Some(val) = obj.get(key) else {
                continue;
            };
            ctx.note_local_match(key);
            let mut sub = ctx.fork(val);
            sub.push_schema_path(&["properties", key]);
            sub.push_instance_path(key);
            let before = errs.len();
            schema.validate_with_context(&mut sub, errs);
            if errs.len() == before {
                ctx.note_evaluated(key);
            }
        }
    }
}

/// `patternProperties` — like `properties`, keyed by regex match.
#[derive(Debug)]
pub struct PatternProperties(Vec<PatternSchema>);

#[derive(Debug)]
struct PatternSchema {
    key: String,
    re: Regex,
    schema: Schema,
}

pub fn new_pattern_properties(value: &Value) -> Result<Box<dyn Keyword>> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::keyword("patternProperties", "must be an object"))?;
    let mut patterns = Vec::with_capacity(obj.len());
    for (key, raw) in obj {
        let re = Regex::new(key).map_err(|e| SchemaError::InvalidPattern {
            pattern: key.clone(),
            source: e,
        })?;
        patterns.push(PatternSchema {
            key: key.clone(),
            re,
            schema: Schema::parse(raw)?,
        });
    }
    patterns.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(Box::new(PatternProperties(patterns)))
}

impl Keyword for PatternProperties {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        for pattern in &self.0 {
            pattern.schema.register(uri, registry);
        }
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        let head = pointer.head()?;
        let found = self.0.iter().find(|p| p.key == head)?;
        found.schema.resolve(&pointer.tail(), uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Object(obj) = ctx.instance else {
            return;
        };
        for (key, val) in obj {
            for pattern in &self.0 {
                if !pattern.re.is_match(key) {
                    continue;
                }
                ctx.note_local_match(key);
                let mut sub = ctx.fork(val);
                sub.push_schema_path(&["patternProperties", &pattern.key]);
                sub.push_instance_path(key);
                let before = errs.len();
                pattern.schema.validate_with_context(&mut sub, errs);
                if errs.len() == before {
                    ctx.note_evaluated(key);
                }
            }
        }
    }
}

/// `additionalProperties` — applies to keys no local keyword matched.
#[derive(Debug)]
pub struct AdditionalProperties(Schema);

pub fn new_additional_properties(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(AdditionalProperties(Schema::parse(value)?)))
}

impl Keyword for AdditionalProperties {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Object(obj) = ctx.instance else {
            return;
        };
        for (key, val) in obj {
            if ctx.local_evaluated_property_names.contains(key) {
                continue;
            }
            let mut sub = ctx.fork(val);
            sub.push_schema_path(&["additionalProperties"]);
            sub.push_instance_path(key);
            if matches!(self.0, Schema::False) {
                add_error(&sub, errs, "additional properties are not allowed");
                continue;
            }
            ctx.note_local_match(key);
            let before = errs.len();
            self.0.validate_with_context(&mut sub, errs);
            if errs.len() == before {
                ctx.note_evaluated(key);
            }
        }
    }
}

/// `propertyNames` — every key string must validate against the subschema.
#[derive(Debug)]
pub struct PropertyNames(Schema);

pub fn new_property_names(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(PropertyNames(Schema::parse(value)?)))
}

impl Keyword for PropertyNames {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Object(obj) = ctx.instance else {
            return;
        };
        for key in obj.keys() {
            let name = Value::String(key.clone());
            let mut sub = ctx.fork(&name);
            sub.push_schema_path(&["propertyNames"]);
            sub.push_instance_path(key);
            self.0.validate_with_context(&mut sub, errs);
        }
    }
}

/// `required` — listed keys must be present.
#[derive(Debug)]
pub struct Required(Vec<String>);

pub fn new_required(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Required(expect_string_array("required", value)?)))
}

impl Keyword for Required {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Object(obj) = ctx.instance else {
            return;
        };
        for key in &self.0 {
            if !obj.contains_key(key) {
                add_error(ctx, errs, format!("\"{key}\" value is required"));
            }
        }
    }
}

/// `maxProperties`
#[derive(Debug)]
pub struct MaxProperties(usize);

pub fn new_max_properties(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(MaxProperties(expect_non_negative_int(
        "maxProperties",
        value,
    )?)))
}

impl Keyword for MaxProperties {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Value::Object(obj) = ctx.instance {
            if obj.len() > self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("{} object properties exceed {} maximum", obj.len(), self.0),
                );
            }
        }
    }
}

/// `minProperties`
#[derive(Debug)]
pub struct MinProperties(usize);

pub fn new_min_properties(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(MinProperties(expect_non_negative_int(
        "minProperties",
        value,
    )?)))
}

impl Keyword for MinProperties {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Value::Object(obj) = ctx.instance {
            if obj.len() < self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("{} object properties below {} minimum", obj.len(), self.0),
                );
            }
        }
    }
}

/// `dependentSchemas` — when a key is present, the whole instance must
/// validate against the paired subschema.
#[derive(Debug)]
pub struct DependentSchemas(BTreeMap<String, Schema>);

pub fn new_dependent_schemas(value: &Value) -> Result<Box<dyn Keyword>> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::keyword("dependentSchemas", "must be an object"))?;
    let mut deps = BTreeMap::new();
    for (key, raw) in obj {
        deps.insert(key.clone(), Schema::parse(raw)?);
    }
    Ok(Box::new(DependentSchemas(deps)))
}

impl Keyword for DependentSchemas {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        for schema in self.0.values() {
            schema.register(uri, registry);
        }
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        let head = pointer.head()?;
        self.0.get(head)?.resolve(&pointer.tail(), uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Object(obj) = ctx.instance else {
            return;
        };
        for (key, schema) in &self.0 {
            if !obj.contains_key(key) {
                continue;
            }
            let mut sub = ctx.fork(ctx.instance);
            sub.push_schema_path(&["dependentSchemas", key]);
            let before = errs.len();
            schema.validate_with_context(&mut sub, errs);
            if errs.len() == before {
                ctx.absorb(&sub);
            }
        }
    }
}

/// `dependentRequired` — when a key is present, its companions must be too.
#[derive(Debug)]
pub struct DependentRequired(BTreeMap<String, Vec<String>>);

pub fn new_dependent_required(value: &Value) -> Result<Box<dyn Keyword>> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::keyword("dependentRequired", "must be an object"))?;
    let mut deps = BTreeMap::new();
    for (key, raw) in obj {
        deps.insert(key.clone(), expect_string_array("dependentRequired", raw)?);
    }
    Ok(Box::new(DependentRequired(deps)))
}

impl Keyword for DependentRequired {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Object(obj) = ctx.instance else {
            return;
        };
        for (key, companions) in &self.0 {
            if !obj.contains_key(key) {
                continue;
            }
            for companion in companions {
                if !obj.contains_key(companion) {
                    add_error(ctx, errs, format!("\"{companion}\" property is required"));
                }
            }
        }
    }
}

/// `unevaluatedProperties` — applies to keys no keyword at this location,
/// including successful in-place applicator branches, evaluated.
#[derive(Debug)]
pub struct UnevaluatedProperties(Schema);

pub fn new_unevaluated_properties(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(UnevaluatedProperties(Schema::parse(value)?)))
}

impl Keyword for UnevaluatedProperties {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Object(obj) = ctx.instance else {
            return;
        };
        for (key, val) in obj {
            if ctx.evaluated_property_names.contains(key) {
                continue;
            }
            let mut sub = ctx.fork(val);
            sub.push_schema_path(&["unevaluatedProperties"]);
            sub.push_instance_path(key);
            if matches!(self.0, Schema::False) {
                add_error(&sub, errs, "unevaluated properties are not allowed");
                continue;
            }
            let before = errs.len();
            self.0.validate_with_context(&mut sub, errs);
            if errs.len() == before {
                ctx.note_evaluated(key);
            }
        }
    }
}
