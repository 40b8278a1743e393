//! Schema parsing, registration, resolution, and the dispatch loop
//!
//! A schema is either a boolean (`true` accepts everything, `false` rejects
//! everything) or an object whose properties decode into an ordered list of
//! keywords. Unknown properties are kept as raw JSON so `$ref`s can still
//! point into them.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::context::{AppContext, ValidationContext};
use crate::error::{KeyError, Result, SchemaError, ValidationState};
use crate::keywords::{add_error, Keyword};
use crate::pointer::Pointer;
use crate::registry;
use crate::schema_debug;
use crate::schema_registry::SchemaRegistry;
use crate::uri::{is_absolute, safe_resolve_url, trim_fragment};

/// A compiled JSON Schema. Cloning is cheap; object schemas share their
/// interior through an `Arc` so registries and resolved-reference caches
/// can hold them without copying.
#[derive(Debug, Clone)]
pub enum Schema {
    /// `true` — accepts every instance
    True,
    /// `false` — rejects every instance
    False,
    /// An object schema with an ordered keyword list
    Object(Arc<ObjectSchema>),
}

/// The interior of an object schema.
#[derive(Debug)]
pub struct ObjectSchema {
    id: Option<String>,
    anchor: Option<String>,
    recursive_anchor: bool,
    doc_path: RwLock<Option<String>>,
    registered: AtomicBool,
    keywords: Vec<(String, Box<dyn Keyword>)>,
    extras: BTreeMap<String, Value>,
    raw: Value,
}

impl ObjectSchema {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn has_keyword(&self, name: &str) -> bool {
        self.keywords.iter().any(|(n, _)| n == name)
    }

    pub(crate) fn keyword(&self, name: &str) -> Option<&dyn Keyword> {
        self.keywords
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kw)| kw.as_ref())
    }
}

impl Schema {
    /// Decode a JSON value into a schema. This is the one fatal error
    /// surface: malformed keyword payloads abort the whole parse.
    pub fn parse(value: &Value) -> Result<Schema> {
        match value {
            Value::Bool(true) => Ok(Schema::True),
            Value::Bool(false) => Ok(Schema::False),
            Value::Object(obj) => {
                let id = match obj.get("$id") {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(_) => return Err(SchemaError::keyword("$id", "must be a string")),
                    None => None,
                };
                let anchor = match obj.get("$anchor") {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(_) => return Err(SchemaError::keyword("$anchor", "must be a string")),
                    None => None,
                };
                let recursive_anchor = matches!(obj.get("$recursiveAnchor"), Some(Value::Bool(true)));

                let mut keywords = Vec::new();
                let mut extras = BTreeMap::new();
                for (name, raw) in obj {
                    if let Some(built) = registry::make_keyword(name, raw) {
                        keywords.push((name.clone(), built?));
                    } else if registry::is_not_supported(name) {
                        schema_debug(&format!(
                            "[Schema] '{name}' is not supported and will be ignored"
                        ));
                    } else {
                        extras.insert(name.clone(), raw.clone());
                    }
                }
                keywords.sort_by_key(|(name, _)| registry::keyword_order(name));

                Ok(Schema::Object(Arc::new(ObjectSchema {
                    id,
                    anchor,
                    recursive_anchor,
                    doc_path: RwLock::new(None),
                    registered: AtomicBool::new(false),
                    keywords,
                    extras,
                    raw: value.clone(),
                })))
            }
            _ => Err(SchemaError::keyword(
                "schema",
                "must be a JSON object or boolean",
            )),
        }
    }

    /// Decode schema bytes.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Schema> {
        let value: Value = serde_json::from_slice(bytes).map_err(SchemaError::json)?;
        Self::parse(&value)
    }

    /// Re-serialize the schema. Key order may differ from the input but the
    /// keyword set and contents are preserved.
    pub fn to_json(&self) -> Value {
        match self {
            Schema::True => Value::Bool(true),
            Schema::False => Value::Bool(false),
            Schema::Object(obj) => obj.raw.clone(),
        }
    }

    /// Canonical document URI, once known.
    pub fn doc_path(&self) -> Option<String> {
        match self {
            Schema::Object(obj) => obj.doc_path.read().expect("doc_path poisoned").clone(),
            _ => None,
        }
    }

    pub(crate) fn set_doc_path(&self, uri: &str) {
        if let Schema::Object(obj) = self {
            *obj.doc_path.write().expect("doc_path poisoned") =
                Some(trim_fragment(uri).to_string());
        }
    }

    /// Walk the schema registering ids and anchors into the per-root
    /// registry and, on first registration, computing the canonical document
    /// path and publishing it globally. Safe to call repeatedly.
    pub fn register(&self, uri: &str, registry: &SchemaRegistry) {
        let Schema::Object(inner) = self else {
            return;
        };

        registry.register_local(self);

        if !inner.registered.swap(true, Ordering::SeqCst) {
            let mut address = inner.id.clone().unwrap_or_default();
            if !uri.is_empty() && !address.is_empty() {
                if let Ok(resolved) = safe_resolve_url(uri, &address) {
                    address = resolved;
                }
            }
            if self.doc_path().is_none() && !address.is_empty() && !address.starts_with('#') {
                self.set_doc_path(&address);
                SchemaRegistry::global().register(self);
            }
        }

        let next_uri = self.doc_path().unwrap_or_else(|| uri.to_string());
        for (_, keyword) in &inner.keywords {
            keyword.register(&next_uri, registry);
        }
    }

    /// Descend through the schema along a JSON Pointer. Each structural
    /// keyword resolves into its named children; an empty pointer addresses
    /// the schema itself and pins its document path.
    pub fn resolve(&self, pointer: &Pointer, uri: &str) -> Option<Schema> {
        match self {
            Schema::True | Schema::False => pointer.is_empty().then(|| self.clone()),
            Schema::Object(inner) => {
                if pointer.is_empty() {
                    match self.doc_path() {
                        Some(existing) => {
                            if !uri.is_empty() {
                                if let Ok(resolved) = safe_resolve_url(uri, &existing) {
                                    self.set_doc_path(&resolved);
                                }
                            }
                        }
                        None => {
                            if !uri.is_empty() {
                                self.set_doc_path(uri);
                            }
                        }
                    }
                    return Some(self.clone());
                }

                let mut uri = uri.to_string();
                if let Some(id) = &inner.id {
                    if is_absolute(id) {
                        uri = id.clone();
                    } else if !uri.is_empty() {
                        if let Ok(resolved) = safe_resolve_url(&uri, id) {
                            uri = resolved;
                        }
                    }
                }

                let head = pointer.head()?.to_string();
                let tail = pointer.tail();
                if let Some(keyword) = inner.keyword(&head) {
                    return keyword.resolve(&tail, &uri);
                }
                if let Some(raw) = inner.extras.get(&head) {
                    let target = tail.eval(raw)?;
                    let schema = Schema::parse(target).ok()?;
                    if schema.doc_path().is_none() && !uri.is_empty() {
                        schema.set_doc_path(&uri);
                    }
                    return Some(schema);
                }
                None
            }
        }
    }

    /// Validate an instance. The `Err` arm is reserved for cancellation;
    /// ordinary failures accumulate on the returned state.
    pub fn validate(&self, app: &AppContext, instance: &Value) -> Result<ValidationState> {
        let mut ctx = ValidationContext::new(self.clone(), instance, app.clone());
        self.register("", &ctx.local_registry);
        // the root document's own URI is the initial resolution base
        ctx.base_uri = self.doc_path().unwrap_or_default();
        let mut errs = Vec::new();
        self.validate_with_context(&mut ctx, &mut errs);
        if ctx.app.is_cancelled() {
            return Err(SchemaError::Cancelled);
        }
        Ok(ValidationState { errs })
    }

    /// Decode instance bytes and validate.
    pub fn validate_bytes(&self, app: &AppContext, bytes: &[u8]) -> Result<ValidationState> {
        let instance: Value = serde_json::from_slice(bytes).map_err(SchemaError::json)?;
        self.validate(app, &instance)
    }

    /// The dispatch loop: run every keyword in evaluation order against the
    /// current context. Errors append; there is no cross-keyword
    /// short-circuit.
    pub(crate) fn validate_with_context(
        &self,
        ctx: &mut ValidationContext<'_>,
        errs: &mut Vec<KeyError>,
    ) {
        match self {
            Schema::True => {}
            Schema::False => add_error(ctx, errs, "schema is always false"),
            Schema::Object(inner) => {
                ctx.local = Some(self.clone());
                ctx.local_registry.register_local(self);

                // arm the dynamic target before references descend: the
                // outermost $recursiveAnchor in scope wins
                if inner.recursive_anchor && ctx.recursive_anchor.is_none() {
                    ctx.recursive_anchor = Some(self.clone());
                }

                if inner.has_keyword("$ref") {
                    if let Some(doc_path) = self.doc_path() {
                        if is_absolute(&doc_path) || ctx.base_uri.is_empty() {
                            ctx.base_uri = doc_path;
                        } else if let Ok(resolved) = safe_resolve_url(&ctx.base_uri, &doc_path) {
                            ctx.base_uri = resolved;
                        }
                    }
                }
                if ctx.base_uri.ends_with('#') {
                    ctx.base_uri = trim_fragment(&ctx.base_uri).to_string();
                }

                for (name, keyword) in &inner.keywords {
                    schema_debug(&format!("[{name}] validating"));
                    keyword.validate(ctx, errs);
                }
            }
        }
    }
}
