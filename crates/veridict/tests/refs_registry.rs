//! References, registries, and loaders working together
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use url::Url;
use veridict::schema_registry::SchemaRegistry;
use veridict::{AppContext, Schema, SchemaError, SchemaLoader};

#[test]
fn ref_into_registered_remote_document() {
    let address = Schema::parse(&json!({
        "$id": "https://veridict.test/refs/address.json",
        "type": "object",
        "properties": {"city": {"type": "string"}},
        "required": ["city"]
    }))
    .unwrap();
    address.register("", &SchemaRegistry::new());

    let person = Schema::parse(&json!({
        "$id": "https://veridict.test/refs/person.json",
        "type": "object",
        "properties": {
            "home": {"$ref": "address.json"}
        }
    }))
    .unwrap();

    let app = AppContext::new();
    assert!(person
        .validate(&app, &json!({"home": {"city": "Lisbon"}}))
        .unwrap()
        .is_valid());
    let state = person.validate(&app, &json!({"home": {}})).unwrap();
    assert_eq!(state.errs.len(), 1);
    assert_eq!(state.errs[0].instance_location, "/home");
    assert_eq!(state.errs[0].message, "\"city\" value is required");
}

#[test]
fn ref_with_pointer_into_remote_document() {
    let library = Schema::parse(&json!({
        "$id": "https://veridict.test/refs/library.json",
        "$defs": {
            "isbn": {"type": "string", "pattern": "^[0-9-]+$"}
        }
    }))
    .unwrap();
    library.register("", &SchemaRegistry::new());

    let book = Schema::parse(&json!({
        "$id": "https://veridict.test/refs/book.json",
        "properties": {
            "isbn": {"$ref": "library.json#/$defs/isbn"}
        }
    }))
    .unwrap();

    let app = AppContext::new();
    assert!(book
        .validate(&app, &json!({"isbn": "978-0-123"}))
        .unwrap()
        .is_valid());
    assert!(!book
        .validate(&app, &json!({"isbn": "nope!"}))
        .unwrap()
        .is_valid());
}

#[test]
fn file_loader_resolves_refs_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target.json");
    let mut file = std::fs::File::create(&target).unwrap();
    file.write_all(br#"{"type": "integer", "minimum": 10}"#)
        .unwrap();

    let target_uri = Url::from_file_path(&target).unwrap();
    let schema = Schema::parse(&json!({
        "properties": {
            "level": {"$ref": target_uri.as_str()}
        }
    }))
    .unwrap();

    let app = AppContext::new();
    assert!(schema.validate(&app, &json!({"level": 12})).unwrap().is_valid());
    assert!(!schema.validate(&app, &json!({"level": 3})).unwrap().is_valid());
}

#[test]
fn unresolvable_remote_ref_is_a_key_error() {
    let schema = Schema::parse(&json!({
        "$ref": "https://veridict.test/not-registered-and-unfetchable.json"
    }))
    .unwrap();
    let app = AppContext::new();
    let state = schema.validate(&app, &json!(1)).unwrap();
    assert_eq!(state.errs.len(), 1);
    assert!(state.errs[0]
        .message
        .starts_with("failed to resolve schema for ref"));
}

struct FixtureLoader;

impl SchemaLoader for FixtureLoader {
    fn fetch(&self, _app: &AppContext, uri: &Url) -> Result<Schema, SchemaError> {
        match uri.path() {
            "/even" => Schema::parse(&json!({"type": "integer", "multipleOf": 2})),
            _ => Err(SchemaError::Load {
                uri: uri.to_string(),
                reason: "no such fixture".to_string(),
            }),
        }
    }
}

#[test]
fn custom_loader_scheme() {
    veridict::register_loader("fixture", Arc::new(FixtureLoader));

    let schema = Schema::parse(&json!({"$ref": "fixture://host/even"})).unwrap();
    let app = AppContext::new();
    assert!(schema.validate(&app, &json!(4)).unwrap().is_valid());
    assert!(!schema.validate(&app, &json!(3)).unwrap().is_valid());
}

#[test]
fn recursive_anchor_retargets_to_outermost() {
    // the classic tree / strict-tree pair: strict-tree extends tree through
    // $ref, and tree's own $recursiveRef must re-target to strict-tree so
    // unevaluatedProperties applies all the way down
    let tree = Schema::parse(&json!({
        "$id": "https://veridict.test/dynamic/tree.json",
        "$recursiveAnchor": true,
        "type": "object",
        "properties": {
            "data": true,
            "children": {
                "type": "array",
                "items": {"$recursiveRef": "#"}
            }
        }
    }))
    .unwrap();
    tree.register("", &SchemaRegistry::new());

    let strict_tree = Schema::parse(&json!({
        "$id": "https://veridict.test/dynamic/strict-tree.json",
        "$recursiveAnchor": true,
        "$ref": "tree.json",
        "unevaluatedProperties": false
    }))
    .unwrap();

    let app = AppContext::new();
    let good = json!({"children": [{"data": 1, "children": []}]});
    assert!(strict_tree.validate(&app, &good).unwrap().is_valid());

    let misspelled = json!({"children": [{"daat": 1}]});
    let state = strict_tree.validate(&app, &misspelled).unwrap();
    assert!(!state.is_valid());
    assert!(state
        .errs
        .iter()
        .any(|e| e.instance_location == "/children/0/daat"));

    // plain tree has no unevaluatedProperties, so the typo passes
    assert!(tree.validate(&app, &misspelled).unwrap().is_valid());
}

#[test]
fn recursive_ref_without_anchor_behaves_like_ref() {
    let schema = Schema::parse(&json!({
        "properties": {
            "next": {"$recursiveRef": "#"}
        },
        "required": ["name"]
    }))
    .unwrap();
    let app = AppContext::new();
    let state = schema
        .validate(&app, &json!({"name": "a", "next": {"next": {}}}))
        .unwrap();
    // the innermost objects are missing "name"
    assert_eq!(state.errs.len(), 2);
    assert!(state.errs.iter().all(|e| e.message == "\"name\" value is required"));
}

#[test]
fn private_registry_overrides_cached_target() {
    let uri = "https://veridict.test/private/override.json";
    let global_target = Schema::parse(&json!({"type": "integer"})).unwrap();
    SchemaRegistry::global().register_at(uri, &global_target);

    // warm the reference cache under the process-wide registry
    let consumer = Schema::parse(&json!({ "$ref": uri })).unwrap();
    let app = AppContext::new();
    assert!(consumer.validate(&app, &json!(5)).unwrap().is_valid());
    assert!(!consumer.validate(&app, &json!("five")).unwrap().is_valid());

    // a private registry mapping the same URI must take over lookup
    let private = Arc::new(SchemaRegistry::new());
    let private_target = Schema::parse(&json!({"type": "string"})).unwrap();
    private.register_at(uri, &private_target);
    let isolated = AppContext::new().with_registry(Arc::clone(&private));
    assert!(consumer.validate(&isolated, &json!("five")).unwrap().is_valid());
    assert!(!consumer.validate(&isolated, &json!(5)).unwrap().is_valid());

    // and the cached global target still serves default runs afterwards
    assert!(consumer.validate(&app, &json!(5)).unwrap().is_valid());
    assert!(!consumer.validate(&app, &json!("five")).unwrap().is_valid());
}

#[test]
fn concurrent_validations_share_no_recursion_state() {
    // the re-entry guard for $recursiveRef is per run: one thread visiting
    // a location must never make another thread skip its own subtree
    let schema = Arc::new(
        Schema::parse(&json!({
            "properties": {
                "next": {"$recursiveRef": "#"}
            },
            "required": ["name"]
        }))
        .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..4 {
        let schema = Arc::clone(&schema);
        handles.push(std::thread::spawn(move || {
            let app = AppContext::new();
            let valid = json!({"name": "a", "next": {"name": "b", "next": {"name": "c"}}});
            let invalid = json!({"name": "a", "next": {"next": {"name": "c"}}});
            for _ in 0..50 {
                assert!(schema.validate(&app, &valid).unwrap().is_valid());
                let state = schema.validate(&app, &invalid).unwrap();
                assert!(!state.is_valid());
                assert_eq!(state.errs[0].instance_location, "/next");
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn private_registry_isolation() {
    let private = Arc::new(SchemaRegistry::new());
    let bool_schema = Schema::parse(&json!({"type": "boolean"})).unwrap();
    private.register_at("https://veridict.test/private/flag.json", &bool_schema);

    let consumer = Schema::parse(&json!({
        "$ref": "https://veridict.test/private/flag.json"
    }))
    .unwrap();

    let isolated = AppContext::new().with_registry(Arc::clone(&private));
    assert!(consumer.validate(&isolated, &json!(true)).unwrap().is_valid());
    assert!(!consumer.validate(&isolated, &json!("x")).unwrap().is_valid());
}
