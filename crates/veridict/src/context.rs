//! Validation contexts and the application context
//!
//! A [`ValidationContext`] is owned by one validation stack frame. Child
//! contexts are created by forking: the fork starts with clean annotation
//! state, and keywords that carry annotations forward merge the child back
//! explicitly with [`ValidationContext::absorb`] after a successful
//! evaluation. Probe evaluations simply drop the fork.
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::pointer::Pointer;
use crate::schema::Schema;
use crate::schema_registry::SchemaRegistry;

/// Ambient per-operation state: cancellation and registry selection.
///
/// The validation inner loop never inspects this; only the loader path does,
/// so a cancelled flag takes effect at the next remote fetch.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    cancel: Option<Arc<AtomicBool>>,
    registry: Option<Arc<SchemaRegistry>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation flag. Setting the flag to `true` makes loaders
    /// refuse further fetches and the overall validation surface
    /// [`SchemaError::Cancelled`](crate::SchemaError::Cancelled).
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Use a private schema registry instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// The schema registry consulted for canonical-URI lookups.
    pub fn registry(&self) -> &SchemaRegistry {
        match &self.registry {
            Some(r) => r,
            None => SchemaRegistry::global(),
        }
    }
}

/// Keyword-to-keyword scratch state, reset on every fork.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    /// Number of elements matched by `contains`, read by `minContains`
    /// and `maxContains`
    pub contains_count: Option<usize>,
    /// Outcome of the `if` probe, read by `then` and `else`
    pub if_result: Option<bool>,
}

/// State for a single evaluation step.
#[derive(Debug)]
pub struct ValidationContext<'a> {
    /// The schema the current validation run was started from
    pub root: Schema,
    /// The schema object currently dispatching keywords
    pub local: Option<Schema>,
    /// The outermost schema seen so far with `$recursiveAnchor: true`
    pub recursive_anchor: Option<Schema>,
    /// The instance fragment under validation
    pub instance: &'a Value,
    /// Base URI for resolving relative references
    pub base_uri: String,
    /// Where we are in the instance
    pub instance_location: Pointer,
    /// Schema path relative to the dispatching schema
    pub relative_location: Pointer,
    /// Schema path within the referenced document
    pub base_relative_location: Pointer,
    /// Highest array index evaluated at this instance location, including
    /// contributions merged from in-place applicators
    pub last_evaluated_index: i64,
    /// Highest array index evaluated by keywords of the local schema object
    pub local_last_evaluated_index: i64,
    /// Property names evaluated at this instance location, including merged
    /// contributions; read by `unevaluatedProperties`
    pub evaluated_property_names: HashSet<String>,
    /// Property names matched by keywords of the local schema object; read
    /// by `additionalProperties`
    pub local_evaluated_property_names: HashSet<String>,
    /// Keyword-to-keyword scratch
    pub scratch: Scratch,
    /// Per-run registry for fragment ids and anchors, shared by all forks
    pub local_registry: Rc<SchemaRegistry>,
    /// Ambient application context
    pub app: AppContext,
    /// Reference visits in progress this run, keyed by reference site and
    /// instance location; shared by all forks so `$recursiveRef` re-entry
    /// detection never leaks across concurrent validations
    visited_refs: Rc<RefCell<HashSet<(usize, String)>>>,
}

impl<'a> ValidationContext<'a> {
    /// Root context for a fresh validation run.
    pub fn new(root: Schema, instance: &'a Value, app: AppContext) -> Self {
        Self {
            root,
            local: None,
            recursive_anchor: None,
            instance,
            base_uri: String::new(),
            instance_location: Pointer::root(),
            relative_location: Pointer::root(),
            base_relative_location: Pointer::root(),
            last_evaluated_index: -1,
            local_last_evaluated_index: -1,
            evaluated_property_names: HashSet::new(),
            local_evaluated_property_names: HashSet::new(),
            scratch: Scratch::default(),
            local_registry: Rc::new(SchemaRegistry::new()),
            app,
            visited_refs: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    /// Fork a child context for a subschema evaluation.
    ///
    /// The fork starts with clean annotation state (empty evaluated sets,
    /// index counters at -1, fresh scratch) and shares the local registry
    /// and application context. Callers adjust the location pointers before
    /// validating into it and decide whether to [`absorb`](Self::absorb)
    /// the result.
    pub fn fork<'b>(&self, instance: &'b Value) -> ValidationContext<'b> {
        ValidationContext {
            root: self.root.clone(),
            local: self.local.clone(),
            recursive_anchor: self.recursive_anchor.clone(),
            instance,
            base_uri: self.base_uri.clone(),
            instance_location: self.instance_location.clone(),
            relative_location: self.relative_location.clone(),
            base_relative_location: self.base_relative_location.clone(),
            last_evaluated_index: -1,
            local_last_evaluated_index: -1,
            evaluated_property_names: HashSet::new(),
            local_evaluated_property_names: HashSet::new(),
            scratch: Scratch::default(),
            local_registry: Rc::clone(&self.local_registry),
            app: self.app.clone(),
            visited_refs: Rc::clone(&self.visited_refs),
        }
    }

    /// True when the given reference site is already validating this
    /// instance location in the current run.
    pub fn ref_visit_in_progress(&self, site: usize, location: &str) -> bool {
        self.visited_refs
            .borrow()
            .contains(&(site, location.to_string()))
    }

    /// Mark a reference site as validating an instance location.
    pub fn begin_ref_visit(&self, site: usize, location: &str) {
        self.visited_refs
            .borrow_mut()
            .insert((site, location.to_string()));
    }

    /// Clear a reference site's visit mark for an instance location.
    pub fn end_ref_visit(&self, site: usize, location: &str) {
        self.visited_refs
            .borrow_mut()
            .remove(&(site, location.to_string()));
    }

    /// Merge a successful child's annotations into this context: set-union
    /// of evaluated names, max of the evaluated index. Used by in-place
    /// applicators; never called for failed branches.
    pub fn absorb(&mut self, child: &ValidationContext<'_>) {
        for name in &child.evaluated_property_names {
            self.evaluated_property_names.insert(name.clone());
        }
        for name in &child.local_evaluated_property_names {
            self.evaluated_property_names.insert(name.clone());
        }
        if child.last_evaluated_index > self.last_evaluated_index {
            self.last_evaluated_index = child.last_evaluated_index;
        }
        if child.local_last_evaluated_index > self.last_evaluated_index {
            self.last_evaluated_index = child.local_last_evaluated_index;
        }
    }

    /// Record that a property name was matched by a keyword of the local
    /// schema object (`properties`/`patternProperties`/`additionalProperties`
    /// coverage, independent of whether the subschema accepted the value).
    pub fn note_local_match(&mut self, name: &str) {
        self.local_evaluated_property_names.insert(name.to_string());
    }

    /// Record that a property was successfully evaluated at this instance
    /// location.
    pub fn note_evaluated(&mut self, name: &str) {
        self.evaluated_property_names.insert(name.to_string());
    }

    /// Record that an array index was covered at this instance location.
    pub fn note_evaluated_index(&mut self, index: usize) {
        let index = index as i64;
        if index > self.last_evaluated_index {
            self.last_evaluated_index = index;
        }
        if index > self.local_last_evaluated_index {
            self.local_last_evaluated_index = index;
        }
    }

    /// Extend both schema-path pointers by the given tokens.
    pub fn push_schema_path(&mut self, tokens: &[&str]) {
        for token in tokens {
            self.relative_location = self.relative_location.descend(token);
            self.base_relative_location = self.base_relative_location.descend(token);
        }
    }

    /// Extend the instance pointer by one token.
    pub fn push_instance_path(&mut self, token: &str) {
        self.instance_location = self.instance_location.descend(token);
    }

    /// `$id` of the currently dispatching schema object, if any.
    pub fn local_id(&self) -> Option<String> {
        match &self.local {
            Some(Schema::Object(obj)) => obj.id().map(str::to_string),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fork_starts_clean() {
        let instance = json!({"a": 1});
        let mut ctx = ValidationContext::new(Schema::True, &instance, AppContext::new());
        ctx.note_evaluated("a");
        ctx.note_local_match("a");
        ctx.note_evaluated_index(3);
        ctx.scratch.if_result = Some(true);

        let sub = ctx.fork(&instance);
        assert!(sub.evaluated_property_names.is_empty());
        assert!(sub.local_evaluated_property_names.is_empty());
        assert_eq!(sub.last_evaluated_index, -1);
        assert_eq!(sub.scratch.if_result, None);
    }

    #[test]
    fn test_absorb_unions_and_maxes() {
        let instance = json!({});
        let mut parent = ValidationContext::new(Schema::True, &instance, AppContext::new());
        parent.note_evaluated("x");

        let mut child = parent.fork(&instance);
        child.note_evaluated("y");
        child.note_local_match("z");
        child.note_evaluated_index(5);

        parent.absorb(&child);
        assert!(parent.evaluated_property_names.contains("x"));
        assert!(parent.evaluated_property_names.contains("y"));
        // local matches of the child count as evaluated for the parent
        assert!(parent.evaluated_property_names.contains("z"));
        // but never leak into the parent's local set
        assert!(!parent.local_evaluated_property_names.contains("z"));
        assert_eq!(parent.last_evaluated_index, 5);
        assert_eq!(parent.local_last_evaluated_index, -1);
    }

    #[test]
    fn test_ref_visit_tracking_spans_forks() {
        let instance = json!({});
        let ctx = ValidationContext::new(Schema::True, &instance, AppContext::new());
        assert!(!ctx.ref_visit_in_progress(1, "/a"));
        ctx.begin_ref_visit(1, "/a");

        let sub = ctx.fork(&instance);
        assert!(sub.ref_visit_in_progress(1, "/a"));
        assert!(!sub.ref_visit_in_progress(2, "/a"));

        sub.end_ref_visit(1, "/a");
        assert!(!ctx.ref_visit_in_progress(1, "/a"));

        // a fresh run starts with no visits
        let other = ValidationContext::new(Schema::True, &instance, AppContext::new());
        assert!(!other.ref_visit_in_progress(1, "/a"));
    }

    #[test]
    fn test_cancellation_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let app = AppContext::new().with_cancel_flag(Arc::clone(&flag));
        assert!(!app.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(app.is_cancelled());
    }
}
