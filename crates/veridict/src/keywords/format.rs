//! The `format` keyword
//!
//! Format is an annotation by default. Ten named formats carry concrete
//! checks; every other name validates successfully.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::context::ValidationContext;
use crate::error::{KeyError, Result, SchemaError};
use crate::keywords::{add_error, Keyword};
use crate::pointer::Pointer;

const EMAIL: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";
const HOSTNAME: &str =
    r"^([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])(\.([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9\-]{0,61}[a-zA-Z0-9]))*$";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(EMAIL).expect("email pattern compiles"))
}

fn hostname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(HOSTNAME).expect("hostname pattern compiles"))
}

/// `format` — named string format.
#[derive(Debug)]
pub struct Format(String);

pub fn new_format(value: &Value) -> Result<Box<dyn Keyword>> {
    let name = value
        .as_str()
        .ok_or_else(|| SchemaError::keyword("format", "must be a string"))?;
    Ok(Box::new(Format(name.to_string())))
}

impl Keyword for Format {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let Value::String(s) = ctx.instance else {
            return;
        };
        if let Err(message) = check_format(&self.0, s) {
            add_error(ctx, errs, message);
        }
    }
}

fn check_format(name: &str, s: &str) -> std::result::Result<(), String> {
    match name {
        "date-time" => valid_date_time(s),
        "date" => valid_date(s),
        "time" => valid_time(s),
        "email" => valid_email(s),
        "hostname" => valid_hostname(s),
        "ipv4" => valid_ipv4(s),
        "ipv6" => valid_ipv6(s),
        "uri" => valid_uri(s),
        "json-pointer" => valid_json_pointer(s),
        "relative-json-pointer" => valid_relative_json_pointer(s),
        // every other named format is an annotation
        _ => Ok(()),
    }
}

fn valid_date_time(s: &str) -> std::result::Result<(), String> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|_| ())
        .map_err(|e| format!("date-time incorrectly formatted: {e}"))
}

fn valid_date(s: &str) -> std::result::Result<(), String> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|e| format!("date incorrectly formatted: {e}"))
}

fn valid_time(s: &str) -> std::result::Result<(), String> {
    // an RFC 3339 full-time is a date-time with an arbitrary date prefix
    valid_date_time(&format!("1970-01-01T{s}"))
        .map_err(|_| "time incorrectly formatted".to_string())
}

fn valid_email(s: &str) -> std::result::Result<(), String> {
    if email_pattern().is_match(s) {
        Ok(())
    } else {
        Err("invalid email format".to_string())
    }
}

fn valid_hostname(s: &str) -> std::result::Result<(), String> {
    if s.len() <= 255 && hostname_pattern().is_match(s) {
        Ok(())
    } else {
        Err("invalid hostname string".to_string())
    }
}

fn valid_ipv4(s: &str) -> std::result::Result<(), String> {
    if s.contains('.') && s.parse::<Ipv4Addr>().is_ok() {
        Ok(())
    } else {
        Err("invalid IPv4 address".to_string())
    }
}

fn valid_ipv6(s: &str) -> std::result::Result<(), String> {
    if s.contains(':') && s.parse::<Ipv6Addr>().is_ok() {
        Ok(())
    } else {
        Err("invalid IPv6 address".to_string())
    }
}

fn valid_uri(s: &str) -> std::result::Result<(), String> {
    Url::parse(s)
        .map(|_| ())
        .map_err(|e| format!("invalid URI: {e}"))
}

fn valid_json_pointer(s: &str) -> std::result::Result<(), String> {
    Pointer::parse(s)
        .map(|_| ())
        .map_err(|_| "invalid JSON pointer".to_string())
}

fn valid_relative_json_pointer(s: &str) -> std::result::Result<(), String> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
        return Err("invalid relative JSON pointer".to_string());
    }
    let rest = &s[digits.len()..];
    if rest.is_empty() || rest == "#" {
        return Ok(());
    }
    valid_json_pointer(rest).map_err(|_| "invalid relative JSON pointer".to_string())
}
