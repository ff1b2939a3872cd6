//! Document formatter: fragments → JSON Schema draft-07 text.
//!
//! Rendering happens once, after synthesis. `serde_json` is built with
//! `preserve_order`, so member order here is emission order and the output
//! text is deterministic.

use serde_json::{json, Map, Value};

use crate::fragment::{Fragment, Literal};
use crate::model::Prim;
use crate::registry::Definitions;

pub const DRAFT07_URI: &str = "http://json-schema.org/draft-07/schema#";

fn prim_type_name(prim: Prim) -> &'static str {
    match prim {
        Prim::String => "string",
        Prim::Int => "integer",
        Prim::Float => "number",
        Prim::Bool => "boolean",
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Str(s) => Value::from(s.clone()),
        Literal::Int(i) => Value::from(*i),
        Literal::Float(f) => Value::from(f.0),
        Literal::Bool(b) => Value::from(*b),
    }
}

/// Render one fragment to a JSON Schema value. Always an object.
pub fn fragment_value(fragment: &Fragment) -> Value {
    match fragment {
        Fragment::Simple(prim) => json!({ "type": prim_type_name(*prim) }),
        Fragment::Null => json!({ "type": "null" }),
        Fragment::AnyOf(items) => {
            json!({ "anyOf": items.iter().map(fragment_value).collect::<Vec<_>>() })
        }
        Fragment::Array(elem) => json!({ "type": "array", "items": fragment_value(elem) }),
        Fragment::Object {
            properties,
            required,
            min_properties,
        } => {
            let mut members = Map::new();
            members.insert("type".into(), Value::from("object"));
            let props: Map<String, Value> = properties
                .iter()
                .map(|(name, frag)| (name.clone(), fragment_value(frag)))
                .collect();
            members.insert("properties".into(), Value::Object(props));
            if !required.is_empty() {
                members.insert(
                    "required".into(),
                    Value::Array(required.iter().cloned().map(Value::from).collect()),
                );
            }
            if let Some(min) = min_properties {
                members.insert("minProperties".into(), Value::from(*min));
            }
            Value::Object(members)
        }
        Fragment::Map { int_keys, value } => {
            if *int_keys {
                json!({
                    "type": "object",
                    "patternProperties": { "^-?[0-9]+$": fragment_value(value) },
                    "additionalProperties": false
                })
            } else {
                json!({ "type": "object", "additionalProperties": fragment_value(value) })
            }
        }
        Fragment::Enum { values, docs } => {
            if docs.iter().any(Option::is_some) {
                // Per-value documentation needs the const-with-description
                // spelling; a bare "enum" list has nowhere to hang it.
                let arms: Vec<Value> = values
                    .iter()
                    .zip(docs)
                    .map(|(value, doc)| {
                        let mut arm = Map::new();
                        arm.insert("const".into(), literal_value(value));
                        if let Some(text) = doc {
                            arm.insert("description".into(), Value::from(text.clone()));
                        }
                        Value::Object(arm)
                    })
                    .collect();
                json!({ "anyOf": arms })
            } else {
                json!({ "enum": values.iter().map(literal_value).collect::<Vec<_>>() })
            }
        }
        Fragment::Ref(name) => json!({ "$ref": format!("#/definitions/{name}") }),
        Fragment::WithDescr { inner, text } => {
            // Every fragment renders to an object, so the description can
            // join the inner members directly.
            let mut value = fragment_value(inner);
            if let Value::Object(members) = &mut value {
                members.insert("description".into(), Value::from(text.clone()));
            }
            value
        }
    }
}

/// Assemble the final document: `$schema`, then `definitions` in
/// registration order (omitted while empty), then the root fragment's own
/// members spliced at the top level.
pub fn document(root: &Fragment, defs: &Definitions) -> Value {
    let mut members = Map::new();
    members.insert("$schema".into(), Value::from(DRAFT07_URI));
    if !defs.is_empty() {
        let rendered: Map<String, Value> = defs
            .iter_done()
            .map(|(name, frag)| (name.to_string(), fragment_value(frag)))
            .collect();
        members.insert("definitions".into(), Value::Object(rendered));
    }
    if let Value::Object(root_members) = fragment_value(root) {
        for (key, value) in root_members {
            members.insert(key, value);
        }
    }
    Value::Object(members)
}

pub fn document_text(root: &Fragment, defs: &Definitions) -> String {
    let value = document(root, defs);
    serde_json::to_string_pretty(&value).expect("a Value tree always serializes")
}

// --------------------------------- Tests ---------------------------------- //
