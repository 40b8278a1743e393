//! Table-driven keyword coverage in the style of the official test suite
//!
//! Copyright (c) 2025 Veridict Team
//! Licensed under the Apache-2.0 license

use serde_json::{json, Value};
use veridict::{AppContext, Schema};

struct Case {
    name: &'static str,
    schema: Value,
    instance: Value,
    valid: bool,
}

fn run(cases: Vec<Case>) {
    let app = AppContext::new();
    for case in cases {
        let schema = Schema::parse(&case.schema)
            .unwrap_or_else(|e| panic!("{}: schema failed to parse: {e}", case.name));
        let state = schema
            .validate(&app, &case.instance)
            .unwrap_or_else(|e| panic!("{}: validation failed to run: {e}", case.name));
        assert_eq!(
            state.is_valid(),
            case.valid,
            "{}: expected valid={}, got errors: {:?}",
            case.name,
            case.valid,
            state.errs
        );
    }
}

#[test]
fn type_cases() {
    run(vec![
        Case { name: "integer accepts int", schema: json!({"type": "integer"}), instance: json!(1), valid: true },
        Case { name: "integer accepts 1.0", schema: json!({"type": "integer"}), instance: json!(1.0), valid: true },
        Case { name: "integer rejects 1.5", schema: json!({"type": "integer"}), instance: json!(1.5), valid: false },
        Case { name: "number accepts int", schema: json!({"type": "number"}), instance: json!(1), valid: true },
        Case { name: "null accepts null", schema: json!({"type": "null"}), instance: json!(null), valid: true },
        Case { name: "null rejects false", schema: json!({"type": "null"}), instance: json!(false), valid: false },
        Case { name: "union accepts either", schema: json!({"type": ["string", "null"]}), instance: json!(null), valid: true },
        Case { name: "union rejects others", schema: json!({"type": ["string", "null"]}), instance: json!(0), valid: false },
    ]);
}

#[test]
fn enum_and_const_cases() {
    run(vec![
        Case { name: "enum match", schema: json!({"enum": [1, "two", null]}), instance: json!("two"), valid: true },
        Case { name: "enum numeric value match", schema: json!({"enum": [2]}), instance: json!(2.0), valid: true },
        Case { name: "enum miss", schema: json!({"enum": [1, "two"]}), instance: json!(3), valid: false },
        Case { name: "const object key order", schema: json!({"const": {"a": 1, "b": 2}}), instance: json!({"b": 2, "a": 1}), valid: true },
        Case { name: "const null", schema: json!({"const": null}), instance: json!(null), valid: true },
        Case { name: "const miss", schema: json!({"const": [1]}), instance: json!([2]), valid: false },
    ]);
}

#[test]
fn numeric_cases() {
    run(vec![
        Case { name: "inclusive bounds", schema: json!({"minimum": 1, "maximum": 3}), instance: json!(3), valid: true },
        Case { name: "exclusive max", schema: json!({"exclusiveMaximum": 3}), instance: json!(3), valid: false },
        Case { name: "exclusive min", schema: json!({"exclusiveMinimum": 1}), instance: json!(1), valid: false },
        Case { name: "multiple of int", schema: json!({"multipleOf": 3}), instance: json!(9), valid: true },
        Case { name: "multiple of fraction", schema: json!({"multipleOf": 0.5}), instance: json!(4.5), valid: true },
        Case { name: "not multiple", schema: json!({"multipleOf": 2}), instance: json!(7), valid: false },
        Case { name: "string ignores bounds", schema: json!({"minimum": 5}), instance: json!("abc"), valid: true },
    ]);
}

#[test]
fn string_cases() {
    run(vec![
        Case { name: "length window", schema: json!({"minLength": 2, "maxLength": 3}), instance: json!("ab"), valid: true },
        Case { name: "too short", schema: json!({"minLength": 2}), instance: json!("a"), valid: false },
        Case { name: "code points not bytes", schema: json!({"maxLength": 2}), instance: json!("é£"), valid: true },
        Case { name: "pattern hit", schema: json!({"pattern": "^a.*z$"}), instance: json!("abcz"), valid: true },
        Case { name: "pattern miss", schema: json!({"pattern": "^a.*z$"}), instance: json!("zcba"), valid: false },
    ]);
}

#[test]
fn array_cases() {
    run(vec![
        Case { name: "items all", schema: json!({"items": {"type": "integer"}}), instance: json!([1, 2]), valid: true },
        Case { name: "items tuple prefix only", schema: json!({"items": [{"type": "integer"}]}), instance: json!([1, "free"]), valid: true },
        Case {
            name: "contains with bounds",
            schema: json!({"contains": {"const": 5}, "minContains": 1, "maxContains": 2}),
            instance: json!([5, 1, 5]),
            valid: true,
        },
        Case {
            name: "contains over max",
            schema: json!({"contains": {"const": 5}, "maxContains": 2}),
            instance: json!([5, 5, 5]),
            valid: false,
        },
        Case { name: "contains empty array", schema: json!({"contains": {"type": "integer"}}), instance: json!([]), valid: false },
        Case { name: "unique ok", schema: json!({"uniqueItems": true}), instance: json!([[1], [2]]), valid: true },
        Case { name: "unique nested dup", schema: json!({"uniqueItems": true}), instance: json!([[1], [1.0]]), valid: false },
        Case { name: "unique disabled", schema: json!({"uniqueItems": false}), instance: json!([1, 1]), valid: true },
    ]);
}

#[test]
fn object_cases() {
    run(vec![
        Case {
            name: "dependent required present",
            schema: json!({"dependentRequired": {"card": ["cvv"]}}),
            instance: json!({"card": "4111", "cvv": "123"}),
            valid: true,
        },
        Case {
            name: "dependent required missing",
            schema: json!({"dependentRequired": {"card": ["cvv"]}}),
            instance: json!({"card": "4111"}),
            valid: false,
        },
        Case {
            name: "property names pattern",
            schema: json!({"propertyNames": {"pattern": "^[a-z]+$"}}),
            instance: json!({"lower": 1, "UPPER": 2}),
            valid: false,
        },
        Case {
            name: "pattern properties typed",
            schema: json!({"patternProperties": {"^n_": {"type": "number"}}}),
            instance: json!({"n_a": 1, "other": "free"}),
            valid: true,
        },
        Case {
            name: "pattern properties violation",
            schema: json!({"patternProperties": {"^n_": {"type": "number"}}}),
            instance: json!({"n_a": "not a number"}),
            valid: false,
        },
        Case {
            name: "non-object ignores object keywords",
            schema: json!({"required": ["a"], "minProperties": 1}),
            instance: json!("scalar"),
            valid: true,
        },
    ]);
}

#[test]
fn combinator_cases() {
    run(vec![
        Case {
            name: "nested allOf anyOf",
            schema: json!({"allOf": [{"anyOf": [{"type": "integer"}, {"type": "string"}]}, {"not": {"const": 0}}]}),
            instance: json!(3),
            valid: true,
        },
        Case {
            name: "nested allOf anyOf reject",
            schema: json!({"allOf": [{"anyOf": [{"type": "integer"}, {"type": "string"}]}, {"not": {"const": 0}}]}),
            instance: json!(0),
            valid: false,
        },
        Case { name: "not of false is everything", schema: json!({"not": false}), instance: json!(42), valid: true },
        Case { name: "not of true is nothing", schema: json!({"not": true}), instance: json!(42), valid: false },
        Case {
            name: "oneOf exactly one",
            schema: json!({"oneOf": [{"required": ["a"]}, {"required": ["b"]}]}),
            instance: json!({"a": 1}),
            valid: true,
        },
        Case {
            name: "oneOf both is failure",
            schema: json!({"oneOf": [{"required": ["a"]}, {"required": ["b"]}]}),
            instance: json!({"a": 1, "b": 2}),
            valid: false,
        },
    ]);
}

#[test]
fn boolean_schema_composition_cases() {
    run(vec![
        Case { name: "property false forbids key", schema: json!({"properties": {"x": false}}), instance: json!({"x": 1}), valid: false },
        Case { name: "property false absent key", schema: json!({"properties": {"x": false}}), instance: json!({}), valid: true },
        Case { name: "items true accepts", schema: json!({"items": true}), instance: json!([1, "a", null]), valid: true },
        Case { name: "defs are inert", schema: json!({"$defs": {"unused": false}}), instance: json!("anything"), valid: true },
    ]);
}

#[test]
fn unknown_and_unsupported_keyword_cases() {
    run(vec![
        Case {
            name: "unknown keywords are ignored",
            schema: json!({"x-vendor": {"anything": [1, 2]}, "type": "string"}),
            instance: json!("ok"),
            valid: true,
        },
        Case {
            name: "not-supported keywords parse but never run",
            schema: json!({"contentEncoding": "base64", "contentMediaType": "image/png", "deprecated": true}),
            instance: json!("definitely-not-base64!!!"),
            valid: true,
        },
        Case {
            name: "legacy definitions bucket is skipped",
            schema: json!({"definitions": {"a": {"type": "integer"}}, "type": "object"}),
            instance: json!({}),
            valid: true,
        },
    ]);
}
