//! Boolean combinators: `allOf`, `anyOf`, `oneOf`, `not`
//!
//! Branch trials run on probe contexts whose errors are discarded; only a
//! successful branch contributes annotations back to the parent.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;

use crate::context::ValidationContext;
use crate::error::{KeyError, Result, SchemaError};
use crate::keywords::{add_error, Keyword};
use crate::pointer::Pointer;
use crate::schema::Schema;
use crate::schema_registry::SchemaRegistry;

fn parse_schema_list(keyword: &str, value: &Value) -> Result<Vec<Schema>> {
    let arr = value
        .as_array()
        .ok_or_else(|| SchemaError::keyword(keyword, "must be an array of schemas"))?;
    if arr.is_empty() {
        return Err(SchemaError::keyword(keyword, "must be a non-empty array"));
    }
    arr.iter().map(Schema::parse).collect()
}

fn resolve_indexed(schemas: &[Schema], pointer: &Pointer, uri: &str) -> Option<Schema> {
    let idx: usize = pointer.head()?.parse().ok()?;
    schemas.get(idx)?.resolve(&pointer.tail(), uri)
}

/// `allOf` — every subschema must pass; annotations merge only on full
/// success.
#[derive(Debug)]
pub struct AllOf(Vec<Schema>);

pub fn new_all_of(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(AllOf(parse_schema_list("allOf", value)?)))
}

impl Keyword for AllOf {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        for schema in &self.0 {
            schema.register(uri, registry);
        }
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        resolve_indexed(&self.0, pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let mut staged = ctx.fork(ctx.instance);
        let mut invalid = false;
        for (i, schema) in self.0.iter().enumerate() {
            let index = i.to_string();
            let mut sub = ctx.fork(ctx.instance);
            sub.push_schema_path(&["allOf", &index]);
            let before = errs.len();
            schema.validate_with_context(&mut sub, errs);
            if errs.len() == before {
                staged.absorb(&sub);
            } else {
                invalid = true;
            }
        }
        if !invalid {
            ctx.absorb(&staged);
        }
    }
}

/// `anyOf` — short-circuits on the first passing subschema and merges that
/// branch's annotations.
#[derive(Debug)]
pub struct AnyOf(Vec<Schema>);

pub fn new_any_of(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(AnyOf(parse_schema_list("anyOf", value)?)))
}

impl Keyword for AnyOf {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        for schema in &self.0 {
            schema.register(uri, registry);
        }
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        resolve_indexed(&self.0, pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        for (i, schema) in self.0.iter().enumerate() {
            let index = i.to_string();
            let mut sub = ctx.fork(ctx.instance);
            sub.push_schema_path(&["anyOf", &index]);
            let mut probe = Vec::new();
            schema.validate_with_context(&mut sub, &mut probe);
            if probe.is_empty() {
                ctx.absorb(&sub);
                return;
            }
        }
        add_error(ctx, errs, "did not match any specified anyOf schemas");
    }
}

/// `oneOf` — exactly one subschema must pass; the matching branch's
/// annotations merge on success.
#[derive(Debug)]
pub struct OneOf(Vec<Schema>);

pub fn new_one_of(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(OneOf(parse_schema_list("oneOf", value)?)))
}

impl Keyword for OneOf {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        for schema in &self.0 {
            schema.register(uri, registry);
        }
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        resolve_indexed(&self.0, pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let mut matched: Option<ValidationContext<'_>> = None;
        for (i, schema) in self.0.iter().enumerate() {
            let index = i.to_string();
            let mut sub = ctx.fork(ctx.instance);
            sub.push_schema_path(&["oneOf", &index]);
            let mut probe = Vec::new();
            schema.validate_with_context(&mut sub, &mut probe);
            if probe.is_empty() {
                if matched.is_some() {
                    add_error(ctx, errs, "matched more than one specified oneOf schemas");
                    return;
                }
                matched = Some(sub);
            }
        }
        match matched {
            Some(sub) => ctx.absorb(&sub),
            None => add_error(ctx, errs, "did not match any of the specified oneOf schemas"),
        }
    }
}

/// `not` — the probe must fail.
#[derive(Debug)]
pub struct Not(Schema);

pub fn new_not(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Not(Schema::parse(value)?)))
}

impl Keyword for Not {
    fn register(&self, uri: &str, registry: &SchemaRegistry) {
        self.0.register(uri, registry);
    }

    fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        self.0.resolve(pointer, uri)
    }

    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let mut sub = ctx.fork(ctx.instance);
        sub.push_schema_path(&["not"]);
        let mut probe = Vec::new();
        self.0.validate_with_context(&mut sub, &mut probe);
        if probe.is_empty() {
            add_error(ctx, errs, "result was valid, ('not') expected invalid");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::context::AppContext;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_all_of() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({
            "allOf": [{"type": "string"}, {"minLength": 3}]
        }))
        .unwrap();
        assert!(schema.validate(&app, &json!("long enough")).unwrap().is_valid());
        assert!(!schema.validate(&app, &json!("ab")).unwrap().is_valid());
        assert!(!schema.validate(&app, &json!(12)).unwrap().is_valid());
    }

    #[test]
    fn test_any_of_short_circuits() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({
            "anyOf": [{"type": "integer"}, {"type": "string"}]
        }))
        .unwrap();
        assert!(schema.validate(&app, &json!(1)).unwrap().is_valid());
        assert!(schema.validate(&app, &json!("x")).unwrap().is_valid());
        let state = schema.validate(&app, &json!(null)).unwrap();
        assert_eq!(state.errs.len(), 1);
        assert_eq!(
            state.errs[0].message,
            "did not match any specified anyOf schemas"
        );
    }

    #[test]
    fn test_one_of_multi_match() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({
            "oneOf": [{"type": "integer"}, {"type": "number"}]
        }))
        .unwrap();
        let state = schema.validate(&app, &json!(5)).unwrap();
        assert_eq!(state.errs.len(), 1);
        assert!(state.errs[0].message.contains("matched more than one"));
        // a plain float matches only the number branch
        assert!(schema.validate(&app, &json!(5.5)).unwrap().is_valid());
    }

    #[test]
    fn test_one_of_no_match() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({
            "oneOf": [{"type": "integer"}, {"type": "boolean"}]
        }))
        .unwrap();
        let state = schema.validate(&app, &json!("neither")).unwrap();
        assert_eq!(
            state.errs[0].message,
            "did not match any of the specified oneOf schemas"
        );
    }

    #[test]
    fn test_not() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({"not": {"type": "string"}})).unwrap();
        assert!(schema.validate(&app, &json!(5)).unwrap().is_valid());
        let state = schema.validate(&app, &json!("nope")).unwrap();
        assert_eq!(
            state.errs[0].message,
            "result was valid, ('not') expected invalid"
        );
    }

    #[test]
    fn test_combinators_reject_empty_lists() {
        assert!(Schema::parse(&json!({"allOf": []})).is_err());
        assert!(Schema::parse(&json!({"anyOf": 5})).is_err());
    }

    #[test]
    fn test_all_of_n_copies_equals_single() {
        let app = AppContext::new();
        let single = Schema::parse(&json!({"type": "integer"})).unwrap();
        let tripled = Schema::parse(&json!({
            "allOf": [{"type": "integer"}, {"type": "integer"}, {"type": "integer"}]
        }))
        .unwrap();
        for instance in [json!(4), json!("x"), json!(null), json!(2.5)] {
            assert_eq!(
                single.validate(&app, &instance).unwrap().is_valid(),
                tripled.validate(&app, &instance).unwrap().is_valid()
            );
        }
    }
}
