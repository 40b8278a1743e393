//! Conditional keywords: `if`, `then`, `else`
//!
//! `if` probes the instance and stashes the boolean outcome in the context
//! scratch; `then` and `else` gate on it. Without a `then` or `else`
//! sibling the probe never runs.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;

use crate::context::ValidationContext;
use crate::error::{KeyError, Result};
use crate::keywords::Keyword;
use crate::pointer::Pointer;
use crate::schema::Schema;
use crate::schema_registry::SchemaRegistry;

/// `if` — probe whose outcome selects `then` or `else`.
#[derive(Debug)]
pub struct If(Schema);

pub fn new_if(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(If(Schema::parse(value)?)))
}

impl Keyword for If {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, _errs: &mut Vec<KeyError>) {
        let has_branch = match &ctx.local {
            Some(Schema::Object(obj)) => obj.has_keyword("then") || obj.has_keyword("else"),
            _ => false,
        };
        if !has_branch {
            return;
        }

        let mut sub = ctx.fork(ctx.instance);
        sub.push_schema_path(&["if"]);
        let mut probe = Vec::new();
        self.0.validate_with_context(&mut sub, &mut probe);
        let passed = probe.is_empty();
        if passed {
            ctx.absorb(&sub);
        }
        ctx.scratch.if_result = Some(passed);
    }
}

/// `then` — runs when the `if` probe passed.
#[derive(Debug)]
pub struct Then(Schema);

pub fn new_then(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Then(Schema::parse(value)?)))
}

impl Keyword for Then {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if ctx.scratch.if_result != Some(true) {
            return;
        }
        let mut sub = ctx.fork(ctx.instance);
        sub.push_schema_path(&["then"]);
        let before = errs.len();
        self.0.validate_with_context(&mut sub, errs);
        if errs.len() == before {
            ctx.absorb(&sub);
        }
    }
}

/// `else` — runs when the `if` probe failed.
#[derive(Debug)]
pub struct Else(Schema);

pub fn new_else(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Else(Schema::parse(value)?)))
}

impl Keyword for Else {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if ctx.scratch.if_result != Some(false) {
            return;
        }
        let mut sub = ctx.fork(ctx.instance);
        sub.push_schema_path(&["else"]);
        let before = errs.len();
        self.0.validate_with_context(&mut sub, errs);
        if errs.len() == before {
            ctx.absorb(&sub);
        }
    }
}
