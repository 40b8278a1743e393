//! Schema registries: canonical-URI lookup plus per-root local lookup
//!
//! The canonical map is keyed by `#`-trimmed absolute URIs and falls back to
//! the loader registry on miss. The local map serves fragment ids
//! (`#name` style `$id`s) and `$anchor` targets within one root document.
//! Lookups take a shared lock; inserts are idempotent.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use tracing::debug;

use crate::context::AppContext;
use crate::error::{Result, SchemaError};
use crate::loader;
use crate::schema::Schema;
use crate::uri::{is_local_schema_id, trim_fragment};

/// Two-level schema lookup table.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Schema>>,
    local: RwLock<HashMap<String, Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default registry.
    pub fn global() -> &'static SchemaRegistry {
        static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    /// Fetch a schema by canonical URI, invoking the loader registry on a
    /// miss and caching the result. Returns `Ok(None)` when the schema is
    /// unavailable; only cancellation is fatal.
    pub fn get(&self, app: &AppContext, uri: &str) -> Result<Option<Schema>> {
        let uri = trim_fragment(uri);
        if let Some(found) = self.get_known(uri) {
            return Ok(Some(found));
        }

        match loader::fetch_schema(app, uri) {
            Ok(schema) => {
                schema.set_doc_path(uri);
                let mut schemas = self.schemas.write().expect("schema registry poisoned");
                let entry = schemas.entry(uri.to_string()).or_insert(schema);
                Ok(Some(entry.clone()))
            }
            Err(SchemaError::Cancelled) => Err(SchemaError::Cancelled),
            Err(err) => {
                debug!(uri, error = %err, "schema fetch failed");
                Ok(None)
            }
        }
    }

    /// Look up a schema by canonical URI without fetching.
    pub fn get_known(&self, uri: &str) -> Option<Schema> {
        let uri = trim_fragment(uri);
        self.schemas
            .read()
            .expect("schema registry poisoned")
            .get(uri)
            .cloned()
    }

    /// Look up a fragment id or anchor in the per-root table.
    pub fn get_local(&self, uri: &str) -> Option<Schema> {
        let uri = trim_fragment(uri);
        self.local
            .read()
            .expect("schema registry poisoned")
            .get(uri)
            .cloned()
    }

    /// Register a schema under an explicit canonical URI, pinning its
    /// document path. Useful for pre-seeding private registries.
    pub fn register_at(&self, uri: &str, schema: &Schema) {
        schema.set_doc_path(uri);
        self.schemas
            .write()
            .expect("schema registry poisoned")
            .insert(trim_fragment(uri).to_string(), schema.clone());
    }

    /// Register a schema under its document path.
    pub fn register(&self, schema: &Schema) {
        let Some(doc_path) = schema.doc_path() else {
            return;
        };
        self.schemas
            .write()
            .expect("schema registry poisoned")
            .insert(doc_path, schema.clone());
    }

    /// Register a schema's fragment `$id` and `$anchor` into the per-root
    /// table.
    pub fn register_local(&self, schema: &Schema) {
        let Schema::Object(obj) = schema else {
            return;
        };

        if let Some(id) = obj.id() {
            if is_local_schema_id(id) {
                self.local
                    .write()
                    .expect("schema registry poisoned")
                    .insert(trim_fragment(id).to_string(), schema.clone());
            }
        }

        if let Some(anchor) = obj.anchor() {
            let doc_path = schema.doc_path().unwrap_or_default();
            let anchor_uri = format!("{doc_path}#{anchor}");
            self.local
                .write()
                .expect("schema registry poisoned")
                .insert(anchor_uri, schema.clone());
        }
    }
}
