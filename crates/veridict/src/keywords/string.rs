//! String keywords: `minLength`, `maxLength`, `pattern`
//!
//! Lengths count Unicode scalar values, not UTF-8 bytes. Patterns compile
//! once at schema-parse time and are not implicitly anchored.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use regex::Regex;
use serde_json::Value;

use crate::context::ValidationContext;
use crate::error::{KeyError, Result, SchemaError};
use crate::keywords::{add_error, Keyword};

fn expect_non_negative_int(keyword: &str, value: &Value) -> Result<usize> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| SchemaError::keyword(keyword, "must be a non-negative integer"))
}

/// `maxLength` — inclusive upper bound on code-point count.
#[derive(Debug)]
pub struct MaxLength(usize);

pub fn new_max_length(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(MaxLength(expect_non_negative_int(
        "maxLength", value,
    )?)))
}

impl Keyword for MaxLength {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Value::String(s) = ctx.instance {
            if s.chars().count() > self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("max length of {} characters exceeded: {}", self.0, s),
                );
            }
        }
    }
}

/// `minLength` — inclusive lower bound on code-point count.
#[derive(Debug)]
pub struct MinLength(usize);

pub fn new_min_length(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(MinLength(expect_non_negative_int(
        "minLength", value,
    )?)))
}

impl Keyword for MinLength {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Value::String(s) = ctx.instance {
            if s.chars().count() < self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("min length of {} characters required: {}", self.0, s),
                );
            }
        }
    }
}

/// `pattern` — an unanchored regular expression the string must match.
#[derive(Debug)]
pub struct Pattern(Regex);

pub fn new_pattern(value: &Value) -> Result<Box<dyn Keyword>> {
    let source = value
        .as_str()
        .ok_or_else(|| SchemaError::keyword("pattern", "must be a string"))?;
    let compiled = Regex::new(source).map_err(|e| SchemaError::InvalidPattern {
        pattern: source.to_string(),
        source: e,
    })?;
    Ok(Box::new(Pattern(compiled)))
}

impl Keyword for Pattern {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Value::String(s) = ctx.instance {
            if !self.0.is_match(s) {
                add_error(
                    ctx,
                    errs,
                    format!("regexp pattern {} mismatch on string: {}", self.0.as_str(), s),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::context::AppContext;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_lengths_count_code_points() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({"minLength": 2, "maxLength": 4})).unwrap();
        assert!(schema.validate(&app, &json!("ab")).unwrap().is_valid());
        assert!(!schema.validate(&app, &json!("héllö")).unwrap().is_valid());
        // four code points, six UTF-8 bytes
        assert!(schema.validate(&app, &json!("héll")).unwrap().is_valid());
        assert!(!schema.validate(&app, &json!("a")).unwrap().is_valid());
        // non-strings pass
        assert!(schema.validate(&app, &json!(12345)).unwrap().is_valid());
    }

    #[test]
    fn test_length_messages() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({"minLength": 3})).unwrap();
        let state = schema.validate(&app, &json!("ab")).unwrap();
        assert_eq!(
            state.errs[0].message,
            "min length of 3 characters required: ab"
        );
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let app = AppContext::new();
        let schema = Schema::parse(&json!({"pattern": "b.t"})).unwrap();
        assert!(schema.validate(&app, &json!("rabbit bit me")).unwrap().is_valid());
        assert!(!schema.validate(&app, &json!("nothing here")).unwrap().is_valid());
    }

    #[test]
    fn test_bad_pattern_is_parse_error() {
        assert!(Schema::parse(&json!({"pattern": "(["})).is_err());
    }
}
