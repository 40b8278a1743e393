//! Canonical JSON equality for `const`, `enum`, and `uniqueItems`
//!
//! `serde_json::Value` equality distinguishes `1` from `1.0`; JSON Schema
//! does not. This module compares numbers by mathematical value and
//! everything else structurally, ignoring object key order.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use serde_json::{Number, Value};

fn number_eq(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Structural deep equality with numeric comparison by value.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => number_eq(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(u, v)| json_equal(u, v))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, u)| y.get(k).is_some_and(|v| json_equal(u, v)))
        }
        _ => false,
    }
}
