//! End-to-end harness: compile embedded model fixtures and assert on the
//! emitted document text. Exits non-zero when any fixture fails.

use once_cell::sync::Lazy;
use serde_json::Value;

struct Fixture {
    name: &'static str,
    model: &'static str,
    root: &'static str,
    check: fn(&Value) -> Result<(), String>,
}

static FIXTURES: Lazy<Vec<Fixture>> = Lazy::new(|| {
    vec![
        Fixture {
            name: "flat struct: required/optional partition",
            model: r#"{"types": [{
                "kind": "struct", "name": "User", "fields": [
                    {"name": "id", "type": {"kind": "prim", "prim": "int"}},
                    {"name": "name", "optional": true,
                     "type": {"kind": "opt", "inner": {"kind": "prim", "prim": "string"}}}
                ]
            }]}"#,
            root: "User",
            check: check_flat_struct,
        },
        Fixture {
            name: "recursive struct terminates with one definition",
            model: r#"{"types": [{
                "kind": "struct", "name": "Node", "fields": [
                    {"name": "children", "optional": true, "type": {
                        "kind": "opt",
                        "inner": {"kind": "array", "elem": {"kind": "named", "name": "Node"}}
                    }}
                ]
            }]}"#,
            root: "Node",
            check: check_recursive_struct,
        },
        Fixture {
            name: "shared type is defined once, referenced twice",
            model: r#"{"types": [
                {"kind": "struct", "name": "Point", "fields": [
                    {"name": "x", "type": {"kind": "prim", "prim": "float"}},
                    {"name": "y", "type": {"kind": "prim", "prim": "float"}}
                ]},
                {"kind": "struct", "name": "Segment", "fields": [
                    {"name": "from", "type": {"kind": "named", "name": "Point"}},
                    {"name": "to", "type": {"kind": "named", "name": "Point"}}
                ]}
            ]}"#,
            root: "Segment",
            check: check_shared_definition,
        },
        Fixture {
            name: "tagged union: simple + complex halves",
            model: r#"{"types": [{
                "kind": "union", "name": "Command", "variants": [
                    {"name": "Stop"},
                    {"name": "Move", "fields": [
                        {"name": "x", "type": {"kind": "prim", "prim": "int"}},
                        {"name": "y", "type": {"kind": "prim", "prim": "int"}}
                    ]}
                ]
            }]}"#,
            root: "Command",
            check: check_tagged_union,
        },
        Fixture {
            name: "documented enum renders const arms",
            model: r#"{"types": [{
                "kind": "wrapper", "name": "Level", "is_enum": true,
                "doc": "severity of a report entry",
                "constants": [
                    {"name": "Info", "value": "info", "doc": "routine"},
                    {"name": "Error", "value": "error"}
                ]
            }]}"#,
            root: "Level",
            check: check_documented_enum,
        },
    ]
});

fn compile(model_src: &str, root: &str) -> Result<String, String> {
    let model: schemac::Model = schemac::load::from_str_with_path(model_src)?;
    schemac::compile(&model, root).map_err(|err| err.to_string())
}

fn pointer<'a>(doc: &'a Value, ptr: &str) -> Result<&'a Value, String> {
    doc.pointer(ptr).ok_or_else(|| format!("missing {ptr}"))
}

fn expect_eq(doc: &Value, ptr: &str, want: Value) -> Result<(), String> {
    let got = pointer(doc, ptr)?;
    if *got != want {
        return Err(format!("{ptr}: got {got}, want {want}"));
    }
    Ok(())
}

// ------------------------------- Fixtures --------------------------------- //

fn check_flat_struct(doc: &Value) -> Result<(), String> {
    expect_eq(doc, "/$schema", "http://json-schema.org/draft-07/schema#".into())?;
    expect_eq(doc, "/$ref", "#/definitions/User".into())?;
    expect_eq(
        doc,
        "/definitions/User/anyOf/1/required",
        serde_json::json!(["id"]),
    )?;
    expect_eq(
        doc,
        "/definitions/User/anyOf/1/properties/id",
        serde_json::json!({"type": "integer"}),
    )?;
    expect_eq(
        doc,
        "/definitions/User/anyOf/1/properties/name",
        serde_json::json!({"anyOf": [{"type": "null"}, {"type": "string"}]}),
    )
}

fn check_recursive_struct(doc: &Value) -> Result<(), String> {
    expect_eq(
        doc,
        "/definitions/Array_Node/anyOf/1/items",
        serde_json::json!({"$ref": "#/definitions/Node"}),
    )?;
    let names: Vec<&String> = doc["definitions"]
        .as_object()
        .ok_or("definitions is not an object")?
        .keys()
        .collect();
    if names.iter().filter(|n| n.as_str() == "Node").count() != 1 {
        return Err(format!("expected exactly one Node definition, got {names:?}"));
    }
    Ok(())
}

fn check_shared_definition(doc: &Value) -> Result<(), String> {
    expect_eq(
        doc,
        "/definitions/Segment/anyOf/1/properties/from",
        serde_json::json!({"$ref": "#/definitions/Point"}),
    )?;
    expect_eq(
        doc,
        "/definitions/Segment/anyOf/1/properties/to",
        serde_json::json!({"$ref": "#/definitions/Point"}),
    )?;
    let text = doc.to_string();
    let copies = text.matches("\"Point\":").count();
    if copies != 1 {
        return Err(format!("Point defined {copies} times"));
    }
    Ok(())
}

fn check_tagged_union(doc: &Value) -> Result<(), String> {
    expect_eq(doc, "/definitions/Command/anyOf/0", serde_json::json!({"type": "null"}))?;
    expect_eq(doc, "/definitions/Command/anyOf/1/minProperties", 1.into())?;
    expect_eq(
        doc,
        "/definitions/Command/anyOf/1/properties/Move/required",
        serde_json::json!(["x", "y"]),
    )?;
    expect_eq(
        doc,
        "/definitions/Command/anyOf/2",
        serde_json::json!({"enum": ["Stop"]}),
    )
}

fn check_documented_enum(doc: &Value) -> Result<(), String> {
    expect_eq(
        doc,
        "/definitions/Level/anyOf/0",
        serde_json::json!({"const": "info", "description": "routine"}),
    )?;
    expect_eq(doc, "/definitions/Level/anyOf/1", serde_json::json!({"const": "error"}))?;
    expect_eq(doc, "/definitions/Level/description", "severity of a report entry".into())
}

// --------------------------------- Runner --------------------------------- //

fn main() {
    let mut failures = 0usize;
    for fixture in FIXTURES.iter() {
        let outcome = run_fixture(fixture);
        match outcome {
            Ok(()) => eprintln!("✅ {}", fixture.name),
            Err(err) => {
                failures += 1;
                eprintln!("❌ {}: {err}", fixture.name);
            }
        }
    }
    if failures > 0 {
        eprintln!("{failures} fixture(s) failed");
        std::process::exit(1);
    }
}

fn run_fixture(fixture: &Fixture) -> Result<(), String> {
    let first = compile(fixture.model, fixture.root)?;
    // Determinism: a second, fresh compilation is byte-identical.
    let second = compile(fixture.model, fixture.root)?;
    if first != second {
        return Err("recompilation produced different text".to_string());
    }
    let doc: Value =
        serde_json::from_str(&first).map_err(|err| format!("output is not JSON: {err}"))?;
    (fixture.check)(&doc)
}
