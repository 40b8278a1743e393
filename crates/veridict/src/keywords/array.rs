//! Array keywords
//!
//! `items` drives the evaluated-index annotation that `additionalItems`
//! and `unevaluatedItems` consume; `contains` records its match count for
//! `minContains`/`maxContains`.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;

use crate::context::ValidationContext;
use crate::equality::json_equal;
use crate::error::{invalid_value_string, KeyError, Result, SchemaError};
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

/// `items` — a single subschema for every element, or a tuple applying by
/// index to the array prefix.
#[derive(Debug)]
pub struct Items {
    single: bool,
    schemas: Vec<Schema>,
}

pub fn new_items(value: &Value) -> Result<Box<dyn Keyword>> {
    match value {
        Value::Array(arr) => {
            let mut schemas = Vec::with_capacity(arr.len());
            for entry in arr {
                schemas.push(Schema::parse(entry)?);
            }
            Ok(Box::new(Items {
                single: false,
                schemas,
            }))
        }
        _ => Ok(Box::new(Items {
            single: true,
            schemas: vec![Schema::parse(value)?],
        })),
    }
}

impl Keyword for Items {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        for schema in &self.schemas {
            schema.register(uri, registry);
        }
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        if self.single {
            return self.schemas[0].resolve(pointer, uri);
        }
        let idx: usize = pointer.head()?.parse().ok()?;
        self.schemas.get(idx)?.resolve(&pointer.tail(), uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Array(arr) = ctx.instance else {
            return;
        };
        if self.single {
            for (i, elem) in arr.iter().enumerate() {
                let mut sub = ctx.fork(elem);
                sub.push_schema_path(&["items"]);
                sub.push_instance_path(&i.to_string());
                self.schemas[0].validate_with_context(&mut sub, errs);
                ctx.note_evaluated_index(i);
            }
        } else {
            for (i, schema) in self.schemas.iter().enumerate() {
                if i >= arr.len() {
                    break;
                }
                let index = i.to_string();
                let mut sub = ctx.fork(&arr[i]);
                sub.push_schema_path(&["items", &index]);
                sub.push_instance_path(&index);
                schema.validate_with_context(&mut sub, errs);
                ctx.note_evaluated_index(i);
            }
        }
    }
}

/// `additionalItems` — applies beyond the prefix a tuple `items` covered.
/// Inactive when `items` evaluated nothing at this level.
#[derive(Debug)]
pub struct AdditionalItems(Schema);

pub fn new_additional_items(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(AdditionalItems(Schema::parse(value)?)))
}

impl Keyword for AdditionalItems {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Array(arr) = ctx.instance else {
            return;
        };
        if ctx.local_last_evaluated_index < 0 {
            return;
        }
        let start = (ctx.local_last_evaluated_index + 1) as usize;
        for i in start..arr.len() {
            let index = i.to_string();
            let mut sub = ctx.fork(&arr[i]);
            sub.push_schema_path(&["additionalItems"]);
            sub.push_instance_path(&index);
            if matches!(self.0, Schema::False) {
                add_error(&sub, errs, "additional items are not allowed");
            } else {
                self.0.validate_with_context(&mut sub, errs);
            }
            ctx.note_evaluated_index(i);
        }
    }
}

/// `maxItems`
#[derive(Debug)]
pub struct MaxItems(usize);

pub fn new_max_items(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(MaxItems(expect_non_negative_int("maxItems", value)?)))
}

impl Keyword for MaxItems {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Value::Array(arr) = ctx.instance {
            if arr.len() > self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("array length {} exceeds {} max", arr.len(), self.0),
                );
            }
        }
    }
}

/// `minItems`
#[derive(Debug)]
pub struct MinItems(usize);

pub fn new_min_items(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(MinItems(expect_non_negative_int("minItems", value)?)))
}

impl Keyword for MinItems {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Value::Array(arr) = ctx.instance {
            if arr.len() < self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("array length {} below {} minimum items", arr.len(), self.0),
                );
            }
        }
    }
}

/// `uniqueItems` — structural equality across elements.
#[derive(Debug)]
pub struct UniqueItems(bool);

pub fn new_unique_items(value: &Value) -> Result<Box<dyn Keyword>> {
    let flag = value
        .as_bool()
        .ok_or_else(|| SchemaError::keyword("uniqueItems", "must be a boolean"))?;
    Ok(Box::new(UniqueItems(flag)))
}

impl Keyword for UniqueItems {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if !self.0 {
            return;
        }
        let Value::Array(arr) = ctx.instance else {
            return;
        };
        for (i, elem) in arr.iter().enumerate() {
            if arr[..i].iter().any(|seen| json_equal(seen, elem)) {
                add_error(
                    ctx,
                    errs,
                    format!(
                        "array items must be unique. duplicated entry: {}",
                        invalid_value_string(elem)
                    ),
                );
                return;
            }
        }
    }
}

/// `contains` — at least one element must match; the match count feeds
/// `minContains`/`maxContains` through the context scratch.
#[derive(Debug)]
pub struct Contains(Schema);

pub fn new_contains(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Contains(Schema::parse(value)?)))
}

impl Keyword for Contains {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Array(arr) = ctx.instance else {
            return;
        };
        let mut matches = 0usize;
        for (i, elem) in arr.iter().enumerate() {
            let mut sub = ctx.fork(elem);
            sub.push_schema_path(&["contains"]);
            sub.push_instance_path(&i.to_string());
            let mut probe = Vec::new();
            self.0.validate_with_context(&mut sub, &mut probe);
            if probe.is_empty() {
                matches += 1;
            }
        }
        if matches > 0 {
            ctx.scratch.contains_count = Some(matches);
        } else {
            add_error(
                ctx,
                errs,
                format!(
                    "must contain at least one of: {}",
                    invalid_value_string(&self.0.to_json())
                ),
            );
        }
    }
}

/// `maxContains` — reads the `contains` match count.
#[derive(Debug)]
pub struct MaxContains(usize);

pub fn new_max_contains(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(MaxContains(expect_non_negative_int(
        "maxContains",
        value,
    )?)))
}

impl Keyword for MaxContains {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if !ctx.instance.is_array() {
            return;
        }
        if let Some(count) = ctx.scratch.contains_count {
            if count > self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("contained items {} exceeds {} max", count, self.0),
                );
            }
        }
    }
}

/// `minContains` — reads the `contains` match count.
#[derive(Debug)]
pub struct MinContains(usize);

pub fn new_min_contains(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(MinContains(expect_non_negative_int(
        "minContains",
        value,
    )?)))
}

impl Keyword for MinContains {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if !ctx.instance.is_array() {
            return;
        }
        if let Some(count) = ctx.scratch.contains_count {
            if count < self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("contained items {} below {} min", count, self.0),
                );
            }
        }
    }
}

/// `unevaluatedItems` — applies to every index no preceding keyword or
/// successful in-place applicator covered.
#[derive(Debug)]
pub struct UnevaluatedItems(Schema);

pub fn new_unevaluated_items(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(UnevaluatedItems(Schema::parse(value)?)))
}

impl Keyword for UnevaluatedItems {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::Array(arr) = ctx.instance else {
            return;
        };
        let start = (ctx.last_evaluated_index + 1).max(0) as usize;
        for i in start..arr.len() {
            let index = i.to_string();
            let mut sub = ctx.fork(&arr[i]);
            sub.push_schema_path(&["unevaluatedItems"]);
            sub.push_instance_path(&index);
            if matches!(self.0, Schema::False) {
                add_error(&sub, errs, "unevaluated items are not allowed");
            } else {
                self.0.validate_with_context(&mut sub, errs);
            }
            ctx.note_evaluated_index(i);
        }
    }
}
