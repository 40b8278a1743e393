//! The process-wide keyword registry
//!
//! Maps keyword names to constructor functions, carries the evaluation-order
//! and insert-order tables that make dispatch deterministic, and knows which
//! keyword names are parsed but never executed. The default draft 2019-09
//! set loads automatically the first time a schema is parsed.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::collections::{HashMap, HashSet};
use std::sync::{OnceLock, RwLock};

use serde_json::Value;

use crate::error::Result;
use crate::keywords::{self, Keyword, KeywordCtor};

/// Registry of keyword constructors plus ordering metadata.
#[derive(Default)]
pub struct KeywordRegistry {
    ctors: HashMap<String, KeywordCtor>,
    orders: HashMap<String, u8>,
    insert_orders: HashMap<String, u32>,
    next_insert_order: u32,
    not_supported: HashSet<String>,
    loaded: bool,
}

impl KeywordRegistry {
    /// Register a keyword constructor, assigning the next insert-order slot.
    pub fn register(&mut self, name: &str, ctor: KeywordCtor) {
        self.ctors.insert(name.to_string(), ctor);
        if !self.insert_orders.contains_key(name) {
            self.next_insert_order += 1;
            self.insert_orders
                .insert(name.to_string(), self.next_insert_order);
        }
    }

    /// Pin a keyword's evaluation-order bucket (default 1).
    pub fn set_order(&mut self, name: &str, order: u8) {
        self.orders.insert(name.to_string(), order);
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    pub fn is_not_supported(&self, name: &str) -> bool {
        self.not_supported.contains(name)
    }

    pub fn order(&self, name: &str) -> u8 {
        self.orders.get(name).copied().unwrap_or(1)
    }

    pub fn insert_order(&self, name: &str) -> u32 {
        self.insert_orders.get(name).copied().unwrap_or(u32::MAX)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn ctor(&self, name: &str) -> Option<KeywordCtor> {
        self.ctors.get(name).copied()
    }

    /// Load the full draft 2019-09 keyword set. Evaluation-order buckets:
    /// references first (0), most keywords at 1, annotation consumers
    /// staged behind their producers (2-4).
    pub fn load_draft_2019_09(&mut self) {
        // core keywords
        self.register("$schema", keywords::core::new_schema_uri);
        self.register("$id", keywords::core::new_id);
        self.register("description", keywords::core::new_description);
        self.register("title", keywords::core::new_title);
        self.register("$comment", keywords::core::new_comment);
        self.register("examples", keywords::core::new_examples);
        self.register("readOnly", keywords::core::new_read_only);
        self.register("writeOnly", keywords::core::new_write_only);
        self.register("$ref", keywords::refs::new_ref);
        self.register("$recursiveRef", keywords::refs::new_recursive_ref);
        self.register("$anchor", keywords::core::new_anchor);
        self.register("$recursiveAnchor", keywords::core::new_recursive_anchor);
        self.register("$defs", keywords::core::new_defs);
        self.register("default", keywords::core::new_default);

        self.set_order("$ref", 0);
        self.set_order("$recursiveRef", 0);

        // standard keywords
        self.register("type", keywords::standard::new_type);
        self.register("enum", keywords::standard::new_enum);
        self.register("const", keywords::standard::new_const);

        // numeric keywords
        self.register("multipleOf", keywords::numeric::new_multiple_of);
        self.register("maximum", keywords::numeric::new_maximum);
        self.register("exclusiveMaximum", keywords::numeric::new_exclusive_maximum);
        self.register("minimum", keywords::numeric::new_minimum);
        self.register("exclusiveMinimum", keywords::numeric::new_exclusive_minimum);

        // string keywords
        self.register("maxLength", keywords::string::new_max_length);
        self.register("minLength", keywords::string::new_min_length);
        self.register("pattern", keywords::string::new_pattern);

        // boolean keywords
        self.register("allOf", keywords::boolean::new_all_of);
        self.register("anyOf", keywords::boolean::new_any_of);
        self.register("oneOf", keywords::boolean::new_one_of);
        self.register("not", keywords::boolean::new_not);

        // object keywords
        self.register("properties", keywords::object::new_properties);
        self.register("patternProperties", keywords::object::new_pattern_properties);
        self.register("additionalProperties", keywords::object::new_additional_properties);
        self.register("required", keywords::object::new_required);
        self.register("propertyNames", keywords::object::new_property_names);
        self.register("maxProperties", keywords::object::new_max_properties);
        self.register("minProperties", keywords::object::new_min_properties);
        self.register("dependentSchemas", keywords::object::new_dependent_schemas);
        self.register("dependentRequired", keywords::object::new_dependent_required);
        self.register("unevaluatedProperties", keywords::object::new_unevaluated_properties);

        self.set_order("properties", 2);
        self.set_order("patternProperties", 2);
        self.set_order("additionalProperties", 3);
        self.set_order("unevaluatedProperties", 4);

        // array keywords
        self.register("items", keywords::array::new_items);
        self.register("additionalItems", keywords::array::new_additional_items);
        self.register("maxItems", keywords::array::new_max_items);
        self.register("minItems", keywords::array::new_min_items);
        self.register("uniqueItems", keywords::array::new_unique_items);
        self.register("contains", keywords::array::new_contains);
        self.register("maxContains", keywords::array::new_max_contains);
        self.register("minContains", keywords::array::new_min_contains);
        self.register("unevaluatedItems", keywords::array::new_unevaluated_items);

        self.set_order("maxContains", 2);
        self.set_order("minContains", 2);
        self.set_order("additionalItems", 2);
        self.set_order("unevaluatedItems", 4);

        // conditional keywords
        self.register("if", keywords::conditional::new_if);
        self.register("then", keywords::conditional::new_then);
        self.register("else", keywords::conditional::new_else);

        self.set_order("then", 2);
        self.set_order("else", 2);

        // optional formats
        self.register("format", keywords::format::new_format);

        // parsed but never executed
        for name in [
            "$vocabulary",
            "contentEncoding",
            "contentMediaType",
            "contentSchema",
            "deprecated",
            "definitions",
            "dependencies",
        ] {
            self.not_supported.insert(name.to_string());
        }

        self.loaded = true;
    }
}

fn global() -> &'static RwLock<KeywordRegistry> {
    static REGISTRY: OnceLock<RwLock<KeywordRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(KeywordRegistry::default()))
}

fn ensure_loaded() {
    let needs_load = { !global().read().expect("keyword registry poisoned").loaded };
    if needs_load {
        let mut reg = global().write().expect("keyword registry poisoned");
        if !reg.loaded {
            reg.load_draft_2019_09();
        }
    }
}

/// Load the draft 2019-09 keyword set into the process-wide registry.
/// Runs automatically on first use; calling it again is a no-op.
pub fn load_draft_2019_09() {
    ensure_loaded();
}

/// Register a custom keyword constructor process-wide.
pub fn register_keyword(name: &str, ctor: KeywordCtor) {
    ensure_loaded();
    let mut reg = global().write().expect("keyword registry poisoned");
    reg.register(name, ctor);
}

/// Pin a custom keyword's evaluation-order bucket.
pub fn set_keyword_order(name: &str, order: u8) {
    ensure_loaded();
    let mut reg = global().write().expect("keyword registry poisoned");
    reg.set_order(name, order);
}

pub(crate) fn is_keyword(name: &str) -> bool {
    ensure_loaded();
    global().read().expect("keyword registry poisoned").is_keyword(name)
}

pub(crate) fn is_not_supported(name: &str) -> bool {
    ensure_loaded();
    global()
        .read()
        .expect("keyword registry poisoned")
        .is_not_supported(name)
}

/// Construct a keyword from its raw JSON value. The constructor is looked up
/// under a short-lived read lock so keyword parsing can recurse into schema
/// parsing without holding the registry.
pub(crate) fn make_keyword(name: &str, value: &Value) -> Option<Result<Box<dyn Keyword>>> {
    ensure_loaded();
    let ctor = {
        global()
            .read()
            .expect("keyword registry poisoned")
            .ctor(name)
    };
    ctor.map(|ctor| ctor(value))
}

pub(crate) fn keyword_order(name: &str) -> (u8, u32) {
    ensure_loaded();
    let reg = global().read().expect("keyword registry poisoned");
    (reg.order(name), reg.insert_order(name))
}
