//! Reference keywords: `$ref` and `$recursiveRef`
//!
//! Resolution is lazy: the first validation resolves the reference and
//! caches the target. In draft 2019-09 references no longer exclude their
//! siblings, so both keywords run first (evaluation order 0) and merge the
//! target's annotations back for the keywords that follow.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::sync::RwLock;

use serde_json::Value;

use crate::context::ValidationContext;
use crate::error::{KeyError, Result, SchemaError};
use crate::keywords::{add_error, Keyword};
use crate::pointer::Pointer;
use crate::schema::Schema;
use crate::schema_debug;
use crate::schema_registry::SchemaRegistry;
use crate::uri::{is_absolute, is_local_schema_id, safe_resolve_url, uri_folder};

/// A resolved reference target.
#[derive(Debug, Clone)]
struct ResolvedRef {
    target: Schema,
    root: Option<Schema>,
    fragment: Pointer,
}

fn expect_reference(keyword: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SchemaError::keyword(keyword, "must be a string"))
}

/// Split a reference into its address and raw fragment parts.
fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('#') {
        Some((addr, frag)) => (addr.trim(), Some(frag)),
        None => (reference.trim(), None),
    }
}

/// The per-keyword resolved-target cache is only valid for the process-wide
/// registry: a private registry on the application context may map the same
/// URI to a different schema, so those runs resolve fresh every time.
fn cacheable(ctx: &ValidationContext<'_>) -> bool {
    std::ptr::eq(ctx.app.registry(), SchemaRegistry::global())
}

/// Resolve a (possibly relative) address against the current base URI,
/// falling back to the local `$id`, then to the folder of the current
/// document.
fn qualify_address(ctx: &ValidationContext<'_>, address: &str, doc_path: &str) -> String {
    if is_absolute(address) {
        return address.to_string();
    }
    if !doc_path.is_empty() {
        if let Ok(resolved) = safe_resolve_url(doc_path, address) {
            return resolved;
        }
    }
    if let Some(id) = ctx.local_id() {
        if is_absolute(&id) {
            if let Ok(resolved) = safe_resolve_url(&id, address) {
                return resolved;
            }
        }
    }
    if !doc_path.is_empty() {
        let folder = uri_folder(doc_path);
        if let Ok(resolved) = safe_resolve_url(&folder, address) {
            return resolved;
        }
    }
    address.to_string()
}

/// Run a resolved target in a clean child context re-rooted at the target
/// document, then merge its annotations back on success.
fn validate_target(
    resolved: &ResolvedRef,
    keyword: &str,
    ctx: &mut ValidationContext<'_>,
    errs: &mut Vec<KeyError>,
) {
    let mut sub = ctx.fork(ctx.instance);
    if let Some(root) = &resolved.root {
        if let Some(doc_path) = root.doc_path() {
            sub.base_uri = doc_path;
        }
        sub.root = root.clone();
    }
    if !resolved.fragment.is_empty() {
        sub.base_relative_location = resolved.fragment.clone();
    }
    sub.relative_location = ctx.relative_location.descend(keyword);

    let before = errs.len();
    resolved.target.validate_with_context(&mut sub, errs);
    if errs.len() == before {
        ctx.absorb(&sub);
    }
}

/// `$ref`
#[derive(Debug)]
pub struct Ref {
    reference: String,
    cache: RwLock<Option<ResolvedRef>>,
}

pub fn new_ref(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Ref {
        reference: expect_reference("$ref", value)?,
        cache: RwLock::new(None),
    }))
}

impl Ref {
    fn resolve_target(&self, ctx: &ValidationContext<'_>) -> Result<Option<ResolvedRef>> {
        // local schema ids short-circuit the URI machinery entirely
        if is_local_schema_id(&self.reference) {
            if let Some(target) = ctx.local_registry.get_local(&self.reference) {
                return Ok(Some(ResolvedRef {
                    target,
                    root: None,
                    fragment: Pointer::root(),
                }));
            }
        }

        let doc_path = ctx.base_uri.clone();
        let (addr_part, frag_part) = split_reference(&self.reference);

        let mut fragment = Pointer::root();
        let mut fragment_localized = false;
        if let Some(frag) = frag_part {
            let frag = if !frag.is_empty() && !frag.starts_with('/') {
                fragment_localized = true;
                format!("/{frag}")
            } else {
                frag.to_string()
            };
            fragment = Pointer::parse(&frag).unwrap_or_default();
        }

        let root = if !addr_part.is_empty() {
            let address = qualify_address(ctx, addr_part, &doc_path);
            ctx.app.registry().get(&ctx.app, &address)?
        } else if !doc_path.is_empty() {
            let address = doc_path.split('#').next().unwrap_or("").to_string();
            match ctx.app.registry().get(&ctx.app, &address)? {
                Some(found) => Some(found),
                None => Some(ctx.root.clone()),
            }
        } else {
            Some(ctx.root.clone())
        };
        let Some(root) = root else {
            return Ok(None);
        };

        // make the target document's anchors addressable in this run
        let root_uri = root.doc_path().unwrap_or_default();
        root.register(&root_uri, &ctx.local_registry);

        if let Some(known) = ctx.app.registry().get_known(&self.reference) {
            return Ok(Some(ResolvedRef {
                target: known,
                root: Some(root),
                fragment,
            }));
        }

        let local_uri = root.doc_path().unwrap_or_else(|| ctx.base_uri.clone());
        if fragment_localized {
            if let Some(head) = fragment.head() {
                let anchored = format!("{local_uri}#{head}");
                let target = ctx
                    .local_registry
                    .get_local(&anchored)
                    .or_else(|| ctx.local_registry.get_local(&format!("#{head}")));
                if let Some(target) = target {
                    return Ok(Some(ResolvedRef {
                        target,
                        root: Some(root),
                        fragment,
                    }));
                }
            }
        }

        let target = if fragment.is_empty() {
            Some(root.clone())
        } else {
            root.resolve(&fragment, &local_uri)
        };
        Ok(target.map(|target| ResolvedRef {
            target,
            root: Some(root),
            fragment,
        }))
    }
}

impl Keyword for Ref {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let cacheable = cacheable(ctx);
        let cached = if cacheable {
            self.cache.read().expect("ref cache poisoned").clone()
        } else {
            None
        };
        let resolved = match cached {
            Some(found) => Some(found),
            None => match self.resolve_target(ctx) {
                Ok(Some(found)) => {
                    if cacheable {
                        *self.cache.write().expect("ref cache poisoned") = Some(found.clone());
                    }
                    Some(found)
                }
                Ok(None) => None,
                Err(SchemaError::Cancelled) => return,
                Err(err) => {
                    schema_debug(&format!("[Ref] resolution failed: {err}"));
                    None
                }
            },
        };

        let Some(resolved) = resolved else {
            add_error(
                ctx,
                errs,
                format!("failed to resolve schema for ref {}", self.reference),
            );
            return;
        };

        validate_target(&resolved, "$ref", ctx, errs);
    }
}

/// `$recursiveRef`
#[derive(Debug)]
pub struct RecursiveRef {
    reference: String,
    cache: RwLock<Option<ResolvedRef>>,
}

pub fn new_recursive_ref(value: &Value) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(RecursiveRef {
        reference: expect_reference("$recursiveRef", value)?,
        cache: RwLock::new(None),
    }))
}

impl RecursiveRef {
    fn dynamic_root(&self, ctx: &ValidationContext<'_>) -> Result<Option<Schema>> {
        let Some(anchor_target) = &ctx.recursive_anchor else {
            return Ok(None);
        };
        // re-target only when the base document itself opts in; without a
        // base URI the run root stands in for the base document
        if ctx.base_uri.is_empty() {
            if let Schema::Object(obj) = &ctx.root {
                if obj.has_keyword("$recursiveAnchor") {
                    return Ok(Some(anchor_target.clone()));
                }
            }
            return Ok(None);
        }
        if let Some(base) = ctx.app.registry().get(&ctx.app, &ctx.base_uri)? {
            if let Schema::Object(obj) = &base {
                if obj.has_keyword("$recursiveAnchor") {
                    return Ok(Some(anchor_target.clone()));
                }
            }
        }
        Ok(None)
    }

    fn resolve_target(
        &self,
        ctx: &ValidationContext<'_>,
        dynamic_root: Option<Schema>,
    ) -> Result<Option<ResolvedRef>> {
        if is_local_schema_id(&self.reference) {
            if let Some(target) = ctx.local_registry.get_local(&self.reference) {
                return Ok(Some(ResolvedRef {
                    target,
                    root: None,
                    fragment: Pointer::root(),
                }));
            }
        }

        let mut doc_path = ctx.base_uri.clone();
        if let Some(root) = &dynamic_root {
            if let Some(dp) = root.doc_path() {
                doc_path = dp;
            }
        }

        let (addr_part, frag_part) = split_reference(&self.reference);
        let fragment = match frag_part {
            Some(frag) => Pointer::parse(frag).unwrap_or_default(),
            None => Pointer::root(),
        };

        let root = match dynamic_root {
            Some(root) => Some(root),
            None => {
                if !addr_part.is_empty() {
                    let address = qualify_address(ctx, addr_part, &doc_path);
                    ctx.app.registry().get(&ctx.app, &address)?
                } else if !doc_path.is_empty() {
                    match ctx.app.registry().get(&ctx.app, &doc_path)? {
                        Some(found) => Some(found),
                        None => Some(ctx.root.clone()),
                    }
                } else {
                    Some(ctx.root.clone())
                }
            }
        };
        let Some(root) = root else {
            return Ok(None);
        };

        let local_uri = root.doc_path().unwrap_or_else(|| ctx.base_uri.clone());
        let target = if fragment.is_empty() {
            Some(root.clone())
        } else {
            root.resolve(&fragment, &local_uri)
        };
        Ok(target.map(|target| ResolvedRef {
            target,
            root: Some(root),
            fragment,
        }))
    }
}

impl Keyword for RecursiveRef {
    fn validate(&self, ctx: &mut ValidationContext<'_>, errs: &mut Vec<KeyError>) {
        let site = self as *const Self as usize;
        let location = ctx.instance_location.to_string();
        if ctx.ref_visit_in_progress(site, &location) {
            // recursion detected, the fixed point is success
            return;
        }

        let dynamic_root = match self.dynamic_root(ctx) {
            Ok(root) => root,
            Err(SchemaError::Cancelled) => return,
            Err(err) => {
                schema_debug(&format!("[RecursiveRef] dynamic resolution failed: {err}"));
                None
            }
        };

        // only the static resolution is cacheable; a dynamic scope can
        // change between call sites
        let resolved = if dynamic_root.is_some() {
            match self.resolve_target(ctx, dynamic_root) {
                Ok(found) => found,
                Err(SchemaError::Cancelled) => return,
                Err(_) => None,
            }
        } else if cacheable(ctx) {
            let cached = self.cache.read().expect("recursive ref cache poisoned").clone();
            match cached {
                Some(found) => Some(found),
                None => match self.resolve_target(ctx, None) {
                    Ok(Some(found)) => {
                        *self.cache.write().expect("recursive ref cache poisoned") =
                            Some(found.clone());
                        Some(found)
                    }
                    Ok(None) => None,
                    Err(SchemaError::Cancelled) => return,
                    Err(_) => None,
                },
            }
        } else {
            match self.resolve_target(ctx, None) {
                Ok(found) => found,
                Err(SchemaError::Cancelled) => return,
                Err(_) => None,
            }
        };

        let Some(resolved) = resolved else {
            add_error(
                ctx,
                errs,
                format!("failed to resolve schema for ref {}", self.reference),
            );
            return;
        };

        ctx.begin_ref_visit(site, &location);
        validate_target(&resolved, "$recursiveRef", ctx, errs);
        ctx.end_ref_visit(site, &location);
    }
}
