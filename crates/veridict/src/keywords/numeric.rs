//! Numeric keywords: `multipleOf` and the four bounds
//!
//! These apply only when the instance is a number; other types pass.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;

use crate::context::ValidationContext;
use crate::error::{KeyError, Result, SchemaError};
use crate::keywords::{add_error, Keyword};

fn expect_number(keyword: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| SchemaError::keyword(keyword, "must be a number"))
}

fn instance_number(ctx: &ValidationContext<'_>) -> Option<f64> {
    ctx.instance.as_f64()
}

/// `multipleOf` — the quotient must be an integer, with a tolerant
/// comparison against its truncation to absorb float error.
#[derive(Debug)]
pub struct MultipleOf(f64);

pub fn new_multiple_of(value: &Value) -> Result<Box<dyn Keyword>> {
    let factor = expect_number("multipleOf", value)?;
    if factor <= 0.0 {
        return Err(SchemaError::keyword(
            "multipleOf",
            "must be strictly greater than 0",
        ));
    }
    Ok(Box::new(MultipleOf(factor)))
}

impl Keyword for MultipleOf {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Some(num) = instance_number(ctx) else {
            return;
        };
        let div = num / self.0;
        if (div - div.round()).abs() > f64::EPSILON * div.abs().max(1.0) {
            add_error(ctx, errs, format!("{} must be a multiple of {}", num, self.0));
        }
    }
}

/// `maximum` — inclusive upper bound.
#[derive(Debug)]
pub struct Maximum(f64);

pub fn new_maximum(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Maximum(expect_number("maximum", value)?)))
}

impl Keyword for Maximum {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Some(num) = instance_number(ctx) {
            if num > self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("{} must be less than or equal to {}", num, self.0),
                );
            }
        }
    }
}

/// `exclusiveMaximum` — strict upper bound.
#[derive(Debug)]
pub struct ExclusiveMaximum(f64);

pub fn new_exclusive_maximum(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(ExclusiveMaximum(expect_number(
        "exclusiveMaximum",
        value,
    )?)))
}

impl Keyword for ExclusiveMaximum {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Some(num) = instance_number(ctx) {
            if num >= self.0 {
                add_error(ctx, errs, format!("{} must be less than {}", num, self.0));
            }
        }
    }
}

/// `minimum` — inclusive lower bound.
#[derive(Debug)]
pub struct Minimum(f64);

pub fn new_minimum(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Minimum(expect_number("minimum", value)?)))
}

impl Keyword for Minimum {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Some(num) = instance_number(ctx) {
            if num < self.0 {
                add_error(
                    ctx,
                    errs,
                    format!("{} must be greater than or equal to {}", num, self.0),
                );
            }
        }
    }
}

/// `exclusiveMinimum` — strict lower bound.
#[derive(Debug)]
pub struct ExclusiveMinimum(f64);

pub fn new_exclusive_minimum(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(ExclusiveMinimum(expect_number(
        "exclusiveMinimum",
        value,
    )?)))
}

impl Keyword for ExclusiveMinimum {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        if let Some(num) = instance_number(ctx) {
            if num <= self.0 {
                add_error(ctx, errs, format!("{} must be greater than {}", num, self.0));
            }
        }
    }
}
