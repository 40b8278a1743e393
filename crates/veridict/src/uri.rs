//! URI resolution helpers for `$id` and `$ref` handling
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use url::Url;

use crate::error::SchemaError;

/// Resolve `reference` against `base`, refusing file access from a
/// network-resolved context.
pub fn safe_resolve_url(base: &str, reference: &str) -> Result<String, SchemaError> {
    let base_url = Url::parse(base).map_err(|e| SchemaError::InvalidUri {
        uri: base.to_string(),
        reason: e.to_string(),
    })?;
    let resolved = base_url
        .join(reference)
        .map_err(|e| SchemaError::InvalidUri {
            uri: reference.to_string(),
            reason: e.to_string(),
        })?;
    if resolved.scheme() == "file" && base_url.scheme() != "file" {
        return Err(SchemaError::CrossSchemeAccess);
    }
    Ok(resolved.to_string())
}

/// True when the URI parses as an absolute URI (has a scheme).
pub fn is_absolute(uri: &str) -> bool {
    Url::parse(uri).is_ok()
}

/// True for local schema ids: fragments that name an anchor within the
/// current document (`#name`) rather than a pointer (`#/...`), the bare
/// root (`#`), or an address with its own authority.
pub fn is_local_schema_id(id: &str) -> bool {
    let parts: Vec<&str> = id.split('#').collect();
    if parts.len() > 1 && !parts[0].is_empty() && !parts[0].starts_with('#') {
        return false;
    }
    id != "#" && !id.starts_with("#/") && id.contains('#')
}

/// Strip a trailing `#` so canonical URIs compare equal with and without
/// the empty fragment.
pub fn trim_fragment(uri: &str) -> &str {
    uri.trim_end_matches('#')
}

/// The enclosing "folder" of a document URI, used as the base when a
/// relative reference must resolve against the current document's location.
pub fn uri_folder(doc_path: &str) -> String {
    if doc_path.ends_with('/') {
        return doc_path.to_string();
    }
    let core = doc_path.split('#').next().unwrap_or(doc_path);
    match core.rfind('/') {
        Some(idx) => core[..=idx].to_string(),
        None => core.to_string(),
    }
}
