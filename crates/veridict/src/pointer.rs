//! RFC 6901 JSON Pointers
//!
//! Keywords use pointers for three things: locating instance fragments,
//! recording schema paths for error reporting, and walking schema trees
//! during `$ref` resolution.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::fmt;

use serde_json::Value;

use crate::error::SchemaError;

/// A parsed JSON Pointer: an ordered list of unescaped reference tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    tokens: Vec<String>,
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl Pointer {
    /// The root pointer, addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a pointer string. The empty string is the root pointer;
    /// anything else must start with `/`.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        if !s.starts_with('/') {
            return Err(SchemaError::InvalidPointer {
                pointer: s.to_string(),
                reason: "must start with '/' or be empty".to_string(),
            });
        }
        for segment in s.split('/').skip(1) {
            let mut chars = segment.chars().peekable();
            while let Some(ch) = chars.next() {
                if ch == '~' && !matches!(chars.peek(), Some('0') | Some('1')) {
                    return Err(SchemaError::InvalidPointer {
                        pointer: s.to_string(),
                        reason: "invalid escape sequence".to_string(),
                    });
                }
            }
        }
        Ok(Self {
            tokens: s.split('/').skip(1).map(unescape).collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// First reference token, if any.
    pub fn head(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Everything after the first token.
    pub fn tail(&self) -> Pointer {
        Pointer {
            tokens: self.tokens.iter().skip(1).cloned().collect(),
        }
    }

    /// A new pointer extended by one raw (unescaped) token.
    pub fn descend(&self, token: &str) -> Pointer {
        let mut tokens = self.tokens.clone();
        tokens.push(token.to_string());
        Pointer { tokens }
    }

    /// Walk the pointer through a JSON value.
    pub fn eval<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        let mut current = value;
        for token in &self.tokens {
            match current {
                Value::Object(obj) => {
                    current = obj.get(token)?;
                }
                Value::Array(arr) => {
                    let idx: usize = token.parse().ok()?;
                    current = arr.get(idx)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}
