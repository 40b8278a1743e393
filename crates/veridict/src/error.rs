//! Error types for schema parsing, loading, and validation
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::fmt;
use std::sync::atomic::{AtomicIsize, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Fatal errors raised while parsing, registering, or loading schemas.
///
/// Validation failures are *not* represented here; those accumulate as
/// [`KeyError`] values on a [`ValidationState`].
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Malformed JSON in a schema or instance document
    #[error("failed to decode JSON: {source}")]
    JsonDecode {
        #[source]
        source: serde_json::Error,
    },

    /// A keyword's raw value does not have the shape the keyword requires
    #[error("invalid value for keyword '{keyword}': {reason}")]
    InvalidKeyword { keyword: String, reason: String },

    /// A regular expression in `pattern`/`patternProperties` failed to compile
    #[error("invalid pattern: {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A URI could not be parsed or resolved
    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// A JSON Pointer was syntactically invalid
    #[error("invalid JSON pointer '{pointer}': {reason}")]
    InvalidPointer { pointer: String, reason: String },

    /// File access from a network-resolved context is refused
    #[error("cannot access file resources from network context")]
    CrossSchemeAccess,

    /// No loader is registered for the URI scheme
    #[error("URI scheme {scheme} is not supported for uri: {uri}")]
    UnsupportedScheme { scheme: String, uri: String },

    /// A loader failed to produce a schema
    #[error("failed to load schema from '{uri}': {reason}")]
    Load { uri: String, reason: String },

    /// I/O failure while reading a local schema document
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The operation was cancelled through the application context
    #[error("operation cancelled")]
    Cancelled,
}

impl SchemaError {
    /// Wrap a serde_json decoding failure
    pub fn json(source: serde_json::Error) -> Self {
        Self::JsonDecode { source }
    }

    /// Build an invalid-keyword error
    pub fn keyword<K, R>(keyword: K, reason: R) -> Self
    where
        K: Into<String>,
        R: Into<String>,
    {
        Self::InvalidKeyword {
            keyword: keyword.into(),
            reason: reason.into(),
        }
    }
}

/// How long a rendered invalid value may get before truncation.
///
/// A value of `-1` disables trimming entirely.
static MAX_ERROR_VALUE_LEN: AtomicIsize = AtomicIsize::new(20);

/// Set the truncation length used when rendering invalid values in error
/// strings. Pass `-1` to disable truncation.
pub fn set_max_error_value_len(len: isize) {
    MAX_ERROR_VALUE_LEN.store(len, Ordering::Relaxed);
}

/// Render a JSON value for inclusion in an error message: single line,
/// truncated to the configured length.
pub fn invalid_value_string(data: &Value) -> String {
    let mut out = match serde_json::to_string(data) {
        Ok(s) => s,
        Err(_) => return String::new(),
    };
    out = out.replace(['\n', '\r'], " ");
    let max = MAX_ERROR_VALUE_LEN.load(Ordering::Relaxed);
    if max >= 0 && out.len() > max as usize {
        let mut cut = max as usize;
        while cut > 0 && !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push_str("...");
    }
    out
}

/// A single validation failure produced by a keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyError {
    /// JSON Pointer into the instance where the failure occurred
    #[serde(rename = "instanceLocation")]
    pub instance_location: String,
    /// JSON Pointer into the schema naming the keyword that failed
    #[serde(rename = "keywordLocation", skip_serializing_if = "Option::is_none")]
    pub keyword_location: Option<String>,
    /// The instance fragment that failed validation
    #[serde(rename = "invalidValue", skip_serializing_if = "Option::is_none")]
    pub invalid_value: Option<Value>,
    /// Human-readable description of the failure
    pub message: String,
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.instance_location, &self.invalid_value) {
            (loc, Some(val)) if !loc.is_empty() => {
                write!(f, "{}: {} {}", loc, invalid_value_string(val), self.message)
            }
            (loc, _) if !loc.is_empty() => write!(f, "{}: {}", loc, self.message),
            (_, Some(val)) => write!(f, "{} {}", invalid_value_string(val), self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// The outcome of validating one instance against a schema.
#[derive(Debug, Default)]
pub struct ValidationState {
    /// All keyword failures, in schema/depth order
    pub errs: Vec<KeyError>,
}

impl ValidationState {
    /// True when no keyword produced an error
    pub fn is_valid(&self) -> bool {
        self.errs.is_empty()
    }
}
