//! Fast/Slow Path Equivalence Tests
//!
//! The primary correctness contract: for every feature both paths
//! represent, identical input produces identical accept/reject decisions
//! and identical coerced values. Each case runs once with the fast path
//! enabled and once forced through the interpreter, then compares
//! outcomes exactly — values, error paths, and error kinds.

use aeromodel::config::EngineConfig;
use aeromodel::decl::{Field, ModelBuilder, ModelDecl, SpecRegistry, TypeExpr};
use aeromodel::model::ModelType;
use serde_json::{json, Value};
use std::sync::Arc;

// =============================================================================
// Harness
// =============================================================================

/// Validates the same document on both paths and asserts identical
/// outcomes. Returns the shared outcome for further assertions.
fn both_paths(decls: Vec<ModelDecl>, model: &str, doc: &Value) -> Result<Value, Vec<(String, String)>> {
    let mut outcomes = Vec::new();
    for config in [EngineConfig::default(), EngineConfig::interpreted_only()] {
        let registry = SpecRegistry::new();
        for decl in &decls {
            registry.register(decl.clone()).unwrap();
        }
        registry.finalize().unwrap();
        let model = ModelType::bind(Arc::new(registry), model, config).unwrap();

        let outcome = match model.parse_obj(doc) {
            Ok(instance) => Ok(Value::Object(instance.to_map())),
            Err(failure) => Err(failure
                .errors()
                .iter()
                .map(|e| (e.path.clone(), e.kind.code().to_string()))
                .collect::<Vec<_>>()),
        };
        outcomes.push(outcome);
    }

    let interpreted = outcomes.pop().unwrap();
    let fast = outcomes.pop().unwrap();
    assert_eq!(fast, interpreted, "paths diverged for document {}", doc);
    fast
}

fn single_field(field: Field) -> Vec<ModelDecl> {
    vec![ModelBuilder::new("m").field(field).build()]
}

// =============================================================================
// Primitive Kinds
// =============================================================================

#[test]
fn test_int_equivalence() {
    let cases = [
        json!({"v": 5}),
        json!({"v": "5"}),
        json!({"v": 5.0}),
        json!({"v": 5.5}),
        json!({"v": "abc"}),
        json!({"v": true}),
        json!({"v": null}),
        json!({"v": -3}),
        json!({"v": 1000}),
    ];
    for doc in &cases {
        both_paths(
            single_field(Field::required("v", TypeExpr::Int).ge(0.0).le(100.0).multiple_of(5.0)),
            "m",
            doc,
        );
    }
}

#[test]
fn test_float_equivalence() {
    let cases = [
        json!({"v": 0.3}),
        json!({"v": 3}),
        json!({"v": "2.5"}),
        json!({"v": "x"}),
        json!({"v": -0.1}),
        json!({"v": 100.35}),
    ];
    for doc in &cases {
        both_paths(
            single_field(Field::required("v", TypeExpr::Float).ge(0.0).multiple_of(0.1)),
            "m",
            doc,
        );
    }
}

#[test]
fn test_str_equivalence() {
    let cases = [
        json!({"v": "  HELLO  "}),
        json!({"v": "ok"}),
        json!({"v": 42}),
        json!({"v": "x"}),
        json!({"v": "toolongvalue"}),
        json!({"v": ["not", "a", "string"]}),
    ];
    for doc in &cases {
        both_paths(
            single_field(
                Field::required("v", TypeExpr::Str)
                    .min_len(2)
                    .max_len(8)
                    .pattern("^[a-z0-9 ]+$")
                    .trim()
                    .lowercase(),
            ),
            "m",
            doc,
        );
    }
}

#[test]
fn test_bool_equivalence() {
    let cases = [
        json!({"v": true}),
        json!({"v": "true"}),
        json!({"v": "False"}),
        json!({"v": 1}),
        json!({"v": 0}),
        json!({"v": 2}),
        json!({"v": "yes"}),
    ];
    for doc in &cases {
        both_paths(single_field(Field::required("v", TypeExpr::Bool)), "m", doc);
    }
}

#[test]
fn test_datetime_and_uuid_equivalence() {
    let cases = [
        json!({"ts": "2024-01-15T10:30:00Z", "id": "67e55044-10b1-426f-9247-bb680e5fe0c8"}),
        json!({"ts": "2024-01-15T10:30:00+02:00", "id": "67E5504410B1426F9247BB680E5FE0C8"}),
        json!({"ts": "yesterday", "id": "nope"}),
        json!({"ts": 1700000000, "id": 12}),
    ];
    let decls = vec![ModelBuilder::new("m")
        .field(Field::required("ts", TypeExpr::Datetime))
        .field(Field::required("id", TypeExpr::Uuid))
        .build()];
    for doc in &cases {
        both_paths(decls.clone(), "m", doc);
    }
}

// =============================================================================
// Composite Kinds
// =============================================================================

#[test]
fn test_list_equivalence() {
    let cases = [
        json!({"v": ["ab", "cd"]}),
        json!({"v": []}),
        json!({"v": ["ab", "x", "cd", 9]}),
        json!({"v": ["ab", "cd", "ab"]}),
        json!({"v": "not-a-list"}),
        json!({"v": ["a1", "a2", "a3", "a4", "a5"]}),
    ];
    for doc in &cases {
        both_paths(
            single_field(
                Field::required("v", TypeExpr::list(TypeExpr::Str))
                    .min_items(1)
                    .max_items(4)
                    .unique_items()
                    .min_len(2),
            ),
            "m",
            doc,
        );
    }
}

#[test]
fn test_optional_equivalence() {
    let cases = [
        json!({"v": null}),
        json!({"v": 7}),
        json!({"v": "7"}),
        json!({"v": "x"}),
        json!({}),
    ];
    for doc in &cases {
        both_paths(
            single_field(Field::nullable("v", TypeExpr::Int)),
            "m",
            doc,
        );
    }
}

#[test]
fn test_union_equivalence() {
    let cases = [
        json!({"v": 5}),
        json!({"v": "5"}),
        json!({"v": "text"}),
        json!({"v": 5.5}),
        json!({"v": [1]}),
        json!({"v": true}),
    ];
    for doc in &cases {
        both_paths(
            single_field(Field::required(
                "v",
                TypeExpr::union(vec![TypeExpr::Int, TypeExpr::Str]),
            )),
            "m",
            doc,
        );
    }
}

#[test]
fn test_nested_model_equivalence() {
    let decls = vec![
        ModelBuilder::new("item")
            .field(Field::required("name", TypeExpr::Str).min_len(2))
            .field(Field::with_default("qty", TypeExpr::Int, json!(1)).ge(1.0))
            .build(),
        ModelBuilder::new("order")
            .field(Field::required("items", TypeExpr::list(TypeExpr::model("item"))))
            .build(),
    ];
    let cases = [
        json!({"items": [{"name": "bolt"}, {"name": "nut", "qty": 4}]}),
        json!({"items": [{"name": "x"}]}),
        json!({"items": [{"name": "bolt", "qty": 0}, {"qty": 2}]}),
        json!({"items": "none"}),
    ];
    for doc in &cases {
        both_paths(decls.clone(), "order", doc);
    }
}

// =============================================================================
// Defaults, Extra Keys, Strict Mode
// =============================================================================

#[test]
fn test_defaults_and_extras_equivalence() {
    let decls = vec![ModelBuilder::new("m")
        .field(Field::required("name", TypeExpr::Str))
        .field(Field::with_default("active", TypeExpr::Bool, json!(true)))
        .build()];
    let cases = [
        json!({"name": "a"}),
        json!({"name": "a", "active": "false"}),
        json!({"name": "a", "surprise": 1}),
    ];
    for doc in &cases {
        both_paths(decls.clone(), "m", doc);
    }
}

#[test]
fn test_strict_model_equivalence() {
    let decls = vec![ModelBuilder::new("m")
        .field(Field::required("n", TypeExpr::Int))
        .field(Field::required("b", TypeExpr::Bool))
        .strict_types(true)
        .build()];
    let cases = [
        json!({"n": 5, "b": true}),
        json!({"n": "5", "b": true}),
        json!({"n": 5, "b": 1}),
        json!({"n": 5.0, "b": true}),
    ];
    for doc in &cases {
        both_paths(decls.clone(), "m", doc);
    }
}

/// Coerced values, not just decisions, must match: the exported mapping
/// from each path is byte-identical.
#[test]
fn test_coerced_values_identical() {
    let outcome = both_paths(
        vec![ModelBuilder::new("m")
            .field(Field::required("n", TypeExpr::Int))
            .field(Field::required("s", TypeExpr::Str).trim())
            .field(Field::required("ts", TypeExpr::Datetime))
            .build()],
        "m",
        &json!({"n": "42", "s": "  pad  ", "ts": "2024-06-01T00:00:00Z"}),
    );
    let value = outcome.unwrap();
    assert_eq!(value["n"], json!(42));
    assert_eq!(value["s"], json!("pad"));
    assert_eq!(value["ts"], json!("2024-06-01T00:00:00+00:00"));
}
