//! Schema loaders: fetching schema documents by URI scheme
//!
//! A loader turns a URI into a parsed [`Schema`]. The registry maps URI
//! schemes to loaders; `http`, `https`, and `file` are built in and the
//! table is user-extensible through [`register_loader`].
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::context::AppContext;
use crate::error::{Result, SchemaError};
use crate::schema::Schema;

/// A source of schema documents for one or more URI schemes.
pub trait SchemaLoader: Send + Sync {
    /// Fetch and parse the schema at `uri`. Implementations should check
    /// `app.is_cancelled()` before doing blocking work.
    fn fetch(&self, app: &AppContext, uri: &Url) -> Result<Schema>;
}

/// Scheme → loader lookup table.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: RwLock<HashMap<String, Arc<dyn SchemaLoader>>>,
}

impl LoaderRegistry {
    /// A registry pre-populated with the built-in loaders.
    pub fn new() -> Self {
        let registry = Self::default();
        registry.register("http", Arc::new(HttpLoader));
        registry.register("https", Arc::new(HttpLoader));
        registry.register("file", Arc::new(FileLoader));
        registry
    }

    /// The process-wide loader registry.
    pub fn global() -> &'static LoaderRegistry {
        static GLOBAL: OnceLock<LoaderRegistry> = OnceLock::new();
        GLOBAL.get_or_init(LoaderRegistry::new)
    }

    /// Register a loader for a URI scheme, replacing any existing one.
    pub fn register(&self, scheme: &str, loader: Arc<dyn SchemaLoader>) {
        self.loaders
            .write()
            .expect("loader registry poisoned")
            .insert(scheme.to_string(), loader);
    }

    /// Loader for a URI scheme, if one is registered.
    pub fn get(&self, scheme: &str) -> Option<Arc<dyn SchemaLoader>> {
        self.loaders
            .read()
            .expect("loader registry poisoned")
            .get(scheme)
            .cloned()
    }
}

/// Register a loader for a URI scheme in the process-wide registry.
pub fn register_loader(scheme: &str, loader: Arc<dyn SchemaLoader>) {
    LoaderRegistry::global().register(scheme, loader);
}

/// Fetch a schema through the process-wide loader registry.
pub(crate) fn fetch_schema(app: &AppContext, uri: &str) -> Result<Schema> {
    debug!(uri, "fetching schema");
    let parsed = Url::parse(uri).map_err(|e| SchemaError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;

    let loader = LoaderRegistry::global()
        .get(parsed.scheme())
        .ok_or_else(|| SchemaError::UnsupportedScheme {
            scheme: parsed.scheme().to_string(),
            uri: uri.to_string(),
        })?;

    loader.fetch(app, &parsed)
}

/// Built-in loader for `http` and `https` URIs.
pub struct HttpLoader;

impl SchemaLoader for HttpLoader {
    fn fetch(&self, app: &AppContext, uri: &Url) -> Result<Schema> {
        if app.is_cancelled() {
            return Err(SchemaError::Cancelled);
        }
        let response = reqwest::blocking::get(uri.clone()).map_err(|e| SchemaError::Load {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        let body: Value = response.json().map_err(|e| SchemaError::Load {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Schema::parse(&body)
    }
}

/// Built-in loader for `file` URIs.
pub struct FileLoader;

impl SchemaLoader for FileLoader {
    fn fetch(&self, app: &AppContext, uri: &Url) -> Result<Schema> {
        if app.is_cancelled() {
            return Err(SchemaError::Cancelled);
        }
        let path = uri
            .to_file_path()
            .map_err(|_| SchemaError::InvalidUri {
                uri: uri.to_string(),
                reason: "not a file path".to_string(),
            })?;
        let bytes = std::fs::read(&path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let body: Value = serde_json::from_slice(&bytes).map_err(SchemaError::json)?;
        Schema::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unsupported_scheme() {
        let app = AppContext::new();
        let err = fetch_schema(&app, "gopher://example.com/schema.json").unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_file_loader_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"type": "string"}"#).unwrap();

        let uri = Url::from_file_path(&path).unwrap();
        let app = AppContext::new();
        let schema = FileLoader.fetch(&app, &uri).unwrap();
        assert!(matches!(schema, Schema::Object(_)));
    }

    #[test]
    fn test_file_loader_missing_file() {
        let uri = Url::parse("file:///definitely/not/there.json").unwrap();
        let app = AppContext::new();
        assert!(matches!(
            FileLoader.fetch(&app, &uri),
            Err(SchemaError::Io { .. })
        ));
    }

    #[test]
    fn test_cancelled_before_fetch() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let flag = Arc::new(AtomicBool::new(false));
        flag.store(true, Ordering::Relaxed);
        let app = AppContext::new().with_cancel_flag(flag);
        let uri = Url::parse("https://example.com/schema.json").unwrap();
        assert!(matches!(
            HttpLoader.fetch(&app, &uri),
            Err(SchemaError::Cancelled)
        ));
    }
}
