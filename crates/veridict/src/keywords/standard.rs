//! Standard keywords: `type`, `enum`, `const`
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;

use crate::context::ValidationContext;
use crate::equality::json_equal;
use crate::error::{invalid_value_string, KeyError, Result, SchemaError};
use crate::keywords::{add_error, Keyword};

const PRIMITIVE_TYPES: [&str; 7] = [
    "null", "boolean", "object", "array", "number", "string", "integer",
];

/// The JSON primitive type of a value, with `"integer"` for whole numbers.
pub fn data_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return "integer";
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.is_finite() => "integer",
                _ => "number",
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Like [`data_type`], with two hinted coercions: a string that parses as a
/// boolean satisfies a `"boolean"` hint, and integer-valued numbers satisfy
/// a `"number"` hint.
pub fn data_type_with_hint(value: &Value, hint: &str) -> &'static str {
    let dt = data_type(value);
    if dt == "string" && hint == "boolean" {
        if let Value::String(s) = value {
            if s == "true" || s == "false" {
                return "boolean";
            }
        }
    }
    if dt == "integer" && hint == "number" {
        return "number";
    }
    dt
}

/// `type` — a single primitive name or a set of them.
#[derive(Debug)]
pub struct Type {
    single: bool,
    vals: Vec<String>,
}

pub fn new_type(value: &Value) -> Result<Box<dyn Keyword>> {
    let (single, vals) = match value {
        Value::String(s) => (true, vec![s.clone()]),
        Value::Array(arr) => {
            let mut vals = Vec::with_capacity(arr.len());
            for entry in arr {
                let s = entry
                    .as_str()
                    .ok_or_else(|| SchemaError::keyword("type", "must be a string or array of strings"))?;
                vals.push(s.to_string());
            }
            (false, vals)
        }
        _ => {
            return Err(SchemaError::keyword(
                "type",
                "must be a string or array of strings",
            ))
        }
    };
    for name in &vals {
        if !PRIMITIVE_TYPES.contains(&name.as_str()) {
            return Err(SchemaError::keyword(
                "type",
                format!("\"{name}\" is not a valid type"),
            ));
        }
    }
    Ok(Box::new(Type { single, vals }))
}

impl Keyword for Type {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let dt = data_type(ctx.instance);
        for name in &self.vals {
            if dt == name || (dt == "integer" && name == "number") {
                return;
            }
            if dt == "string" && data_type_with_hint(ctx.instance, name) == name.as_str() {
                return;
            }
        }
        if self.single || self.vals.len() == 1 {
            add_error(ctx, errs, format!("type should be {}", self.vals[0]));
        } else {
            add_error(
                ctx,
                errs,
                format!("type should be one of: {}", self.vals.join(",")),
            );
        }
    }
}

/// `const` — the instance must deep-equal the literal.
#[derive(Debug)]
pub struct Const(Value);

pub fn new_const(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Const(value.clone())))
}

impl Keyword for Const {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if !json_equal(&self.0, ctx.instance) {
            add_error(
                ctx,
                errs,
                format!("must equal {}", invalid_value_string(&self.0)),
            );
        }
    }
}

/// `enum` — the instance must deep-equal one of the listed values.
#[derive(Debug)]
pub struct Enum(Vec<Value>);

pub fn new_enum(value: &Value) -> Result<Box<dyn Keyword>> {
    let arr = value
        .as_array()
        .ok_or_else(|| SchemaError::keyword("enum", "must be an array"))?;
    Ok(Box::new(Enum(arr.clone())))
}

impl Keyword for Enum {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        for candidate in &self.0 {
            if json_equal(candidate, ctx.instance) {
                return;
            }
        }
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|v| serde_json::to_string(v).unwrap_or_default())
            .collect();
        add_error(
            ctx,
            errs,
            format!("should be one of [{}]", rendered.join(", ")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AppContext;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_data_type() {
        assert_eq!(data_type(&json!(null)), "null");
        assert_eq!(data_type(&json!(true)), "boolean");
        assert_eq!(data_type(&json!(5)), "integer");
        assert_eq!(data_type(&json!(5.0)), "integer");
        assert_eq!(data_type(&json!(5.5)), "number");
        assert_eq!(data_type(&json!("x")), "string");
        assert_eq!(data_type(&json!([])), "array");
        assert_eq!(data_type(&json!({})), "object");
    }

    #[test]
    fn test_data_type_with_hint() {
        assert_eq!(data_type_with_hint(&json!("true"), "boolean"), "boolean");
        assert_eq!(data_type_with_hint(&json!("yes"), "boolean"), "string");
        assert_eq!(data_type_with_hint(&json!(3.0), "number"), "number");
    }

    #[test]
    fn test_type_keyword() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({"type": "string"})).unwrap();
        assert!(schema.validate(&app, &json!("ok")).unwrap().is_valid());
        let state = schema.validate(&app, &json!(5)).unwrap();
        assert_eq!(state.errs[0].message, "type should be string");

        let multi = Schema::parse(&json!({"type": ["integer", "null"]})).unwrap();
        assert!(multi.validate(&app, &json!(3)).unwrap().is_valid());
        assert!(multi.validate(&app, &json!(null)).unwrap().is_valid());
        let state = multi.validate(&app, &json!("x")).unwrap();
        assert_eq!(state.errs[0].message, "type should be one of: integer,null");
    }

    #[test]
    fn test_integer_satisfies_number() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({"type": "number"})).unwrap();
        assert!(schema.validate(&app, &json!(7)).unwrap().is_valid());
        let int_schema = Schema::parse(&json!({"type": "integer"})).unwrap();
        assert!(int_schema.validate(&app, &json!(7.0)).unwrap().is_valid());
        assert!(!int_schema.validate(&app, &json!(7.5)).unwrap().is_valid());
    }

    #[test]
    fn test_type_rejects_unknown_name() {
        assert!(Schema::parse(&json!({"type": "float"})).is_err());
    }

    #[test]
    fn test_const_message() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({"const": "a value"})).unwrap();
        let state = schema.validate(&app, &json!("a different value")).unwrap();
        assert_eq!(state.errs.len(), 1);
        assert_eq!(state.errs[0].message, "must equal \"a value\"");
    }

    #[test]
    fn test_const_numeric_equality() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({"const": 1})).unwrap();
        assert!(schema.validate(&app, &json!(1.0)).unwrap().is_valid());
    }

    #[test]
    fn test_enum() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({"enum": ["red", "green", 3]})).unwrap();
        assert!(schema.validate(&app, &json!("red")).unwrap().is_valid());
        assert!(schema.validate(&app, &json!(3.0)).unwrap().is_valid());
        assert!(!schema.validate(&app, &json!("blue")).unwrap().is_valid());
    }
}
