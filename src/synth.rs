//! Schema synthesizer: the dispatcher.
//!
//! One `Synthesizer` = one compilation run over one model. `synth` walks a
//! type reference, classifies it, and delegates to the encoders; every
//! named shape is computed at most once per canonical name (the registry
//! short-circuit), which is what makes recursive and shared types
//! terminate.
//!
//! Design goals:
//! - One computation per distinct canonical type; pending placeholders
//!   terminate recursion instead of any depth or time limit.
//! - Fail fast: no partial or default schema is ever substituted, and a
//!   failed attempt leaves no registry residue.
//! - Deterministic: identical inputs produce byte-identical documents.

pub mod object;
pub mod variants;
pub mod wrapper;

use crate::error::{Result, SchemaError};
use crate::fragment::{nullable, Fragment};
use crate::model::{bind, Decl, Model, Prim, TypeRef};
use crate::registry::Definitions;

// ------------------------------ Entry point ------------------------------- //

/// Compile one root declaration to JSON Schema draft-07 text.
///
/// The root must name a declared, non-generic type; anything else is
/// `InvalidEntryPoint`.
pub fn compile(model: &Model, root: &str) -> Result<String> {
    let decl = model.get(root).ok_or_else(|| {
        SchemaError::InvalidEntryPoint(format!("`{root}` is not a declared type"))
    })?;
    if !decl.params().is_empty() {
        return Err(SchemaError::InvalidEntryPoint(format!(
            "`{root}` is generic over {} parameter(s); a concrete type is required",
            decl.params().len()
        )));
    }
    let mut synthesizer = Synthesizer::new(model);
    let root_ty = TypeRef::Named {
        name: root.to_string(),
        args: Vec::new(),
    };
    let fragment = synthesizer.synth(&root_ty)?;
    Ok(crate::render::document_text(
        &fragment,
        synthesizer.definitions(),
    ))
}

// ------------------------------- Dispatcher ------------------------------- //

/// One compilation run: the model plus the definition table threaded
/// through every recursive call.
pub struct Synthesizer<'a> {
    pub(crate) model: &'a Model,
    pub(crate) defs: Definitions,
    /// Alias names currently being resolved; re-entry is a cycle.
    alias_stack: Vec<String>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self {
            model,
            defs: Definitions::new(),
            alias_stack: Vec::new(),
        }
    }

    pub fn definitions(&self) -> &Definitions {
        &self.defs
    }

    pub fn synth(&mut self, ty: &TypeRef) -> Result<Fragment> {
        self.synth_as(ty, None)
    }

    /// Synthesize `ty`, registering named shapes under `name` (default:
    /// the canonical name). An already-registered name returns `Ref`
    /// immediately, pending placeholders included.
    pub fn synth_as(&mut self, ty: &TypeRef, name: Option<&str>) -> Result<Fragment> {
        match ty {
            // Primitives are inlined, never named.
            TypeRef::Prim { prim } => Ok(Fragment::Simple(*prim)),

            // The optional wrapper is transparent: a null union around the
            // inner schema, never a definition of its own.
            TypeRef::Opt { inner } => Ok(nullable(self.synth(inner)?)),

            TypeRef::Var { var } => Err(SchemaError::UnsupportedType {
                name: var.clone(),
                reason: "unbound type parameter".to_string(),
            }),

            TypeRef::Array { elem } => {
                let def_name = named(ty, name);
                if self.defs.has(&def_name) {
                    return Ok(Fragment::Ref(def_name));
                }
                let elem_schema = self.synth(elem)?;
                self.defs.fulfil(
                    &def_name,
                    nullable(Fragment::Array(Box::new(elem_schema))),
                    None,
                );
                Ok(Fragment::Ref(def_name))
            }

            TypeRef::Map { key, value } => {
                let def_name = named(ty, name);
                if self.defs.has(&def_name) {
                    return Ok(Fragment::Ref(def_name));
                }
                // Key check comes first: nothing may be registered under
                // the map's name when the key is unsupported.
                let int_keys = self.map_key_kind(key, &def_name)?;
                let value_schema = self.synth(value)?;
                self.defs.fulfil(
                    &def_name,
                    nullable(Fragment::Map {
                        int_keys,
                        value: Box::new(value_schema),
                    }),
                    None,
                );
                Ok(Fragment::Ref(def_name))
            }

            TypeRef::Anon { fields } => {
                let def_name = named(ty, name);
                if self.defs.has(&def_name) {
                    return Ok(Fragment::Ref(def_name));
                }
                object::encode_anon(self, fields, &def_name)
            }

            TypeRef::Named { name: target, args } => {
                let def_name = named(ty, name);
                if self.defs.has(&def_name) {
                    return Ok(Fragment::Ref(def_name));
                }
                self.synth_named(target, args, &def_name)
            }
        }
    }

    fn synth_named(&mut self, target: &str, args: &[TypeRef], def_name: &str) -> Result<Fragment> {
        let model = self.model;
        let decl = model.get(target).ok_or_else(|| SchemaError::UnsupportedType {
            name: target.to_string(),
            reason: "unknown type".to_string(),
        })?;
        if decl.params().len() != args.len() {
            return Err(SchemaError::InvalidEntryPoint(format!(
                "`{target}` expects {} type argument(s), got {}",
                decl.params().len(),
                args.len()
            )));
        }
        let bindings = bind(decl.params(), args);
        match decl {
            Decl::Struct(d) => object::encode_struct(self, d, &bindings, def_name),
            Decl::Union(d) => variants::encode_union(self, d, &bindings, def_name),
            Decl::Wrapper(w) if w.is_enum => variants::encode_value_enum(self, w, def_name),
            Decl::Wrapper(w) => wrapper::encode_wrapper(self, w, &bindings, def_name),
            Decl::Alias(a) => {
                // The target is synthesized under the alias's own name;
                // the alias doc rewraps whatever came out. An alias cannot
                // reach itself again while its target is being resolved:
                // nothing is registered yet, so re-entry would recurse
                // forever.
                if self.alias_stack.iter().any(|seen| seen == target) {
                    return Err(SchemaError::UnsupportedType {
                        name: target.to_string(),
                        reason: "alias cycle".to_string(),
                    });
                }
                let target_ty = a.target.instantiate(&bindings);
                self.alias_stack.push(target.to_string());
                let fragment = self.synth_as(&target_ty, Some(def_name));
                self.alias_stack.pop();
                let fragment = fragment?;
                match a.doc.as_deref().filter(|d| !d.is_empty()) {
                    None => Ok(fragment),
                    Some(doc) => match &fragment {
                        Fragment::Ref(registered) => {
                            let registered = registered.clone();
                            self.defs.wrap_doc(&registered, doc);
                            Ok(fragment)
                        }
                        _ => Ok(fragment.with_descr(doc)),
                    },
                }
            }
        }
    }

    /// Resolve a map key to string-likeness or integer-likeness, following
    /// alias chains. Anything else is a hard error.
    fn map_key_kind(&self, key: &TypeRef, map_name: &str) -> Result<bool> {
        let mut cur = key.clone();
        let mut hops = 0usize;
        loop {
            match cur {
                TypeRef::Prim { prim: Prim::String } => return Ok(false),
                TypeRef::Prim { prim: Prim::Int } => return Ok(true),
                ref other => match self.model.alias_step(other) {
                    Some(next) if hops < 64 => {
                        hops += 1;
                        cur = next;
                    }
                    _ => {
                        return Err(SchemaError::UnsupportedMapKey {
                            map: map_name.to_string(),
                            key: key.canonical_name(),
                        })
                    }
                },
            }
        }
    }

    /// Reserve `name`, run `body`, abandon the placeholder on failure.
    /// The placeholder stays visible to nested recursive calls, which is
    /// what turns self-reference into a `Ref` instead of re-descent.
    pub(crate) fn with_placeholder<T>(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.defs.reserve(name);
        let out = body(self);
        if out.is_err() {
            self.defs.abandon(name);
        }
        out
    }
}

fn named(ty: &TypeRef, name: Option<&str>) -> String {
    match name {
        Some(given) => given.to_string(),
        None => ty.canonical_name(),
    }
}

// --------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(doc: serde_json::Value) -> Model {
        serde_json::from_value(doc).expect("test model decodes")
    }

    fn schema(doc: serde_json::Value, root: &str) -> serde_json::Value {
        let text = compile(&model(doc), root).expect("compiles");
        serde_json::from_str(&text).expect("valid JSON out")
    }

    #[test]
    fn struct_with_required_and_optional_fields() {
        let out = schema(
            json!({"types": [{
                "kind": "struct",
                "name": "User",
                "fields": [
                    {"name": "id", "type": {"kind": "prim", "prim": "int"}},
                    {"name": "name", "type": {"kind": "opt", "inner": {"kind": "prim", "prim": "string"}}, "optional": true}
                ]
            }]}),
            "User",
        );
        let user = &out["definitions"]["User"]["anyOf"][1];
        assert_eq!(user["required"], json!(["id"]));
        assert_eq!(user["properties"]["id"], json!({"type": "integer"}));
        assert_eq!(
            user["properties"]["name"],
            json!({"anyOf": [{"type": "null"}, {"type": "string"}]})
        );
        assert_eq!(out["$ref"], json!("#/definitions/User"));
    }

    #[test]
    fn pure_value_enum_without_null_constant() {
        let out = schema(
            json!({"types": [{
                "kind": "wrapper",
                "name": "Color",
                "is_enum": true,
                "repr": {"kind": "prim", "prim": "string"},
                "constants": [
                    {"name": "A", "value": "A"},
                    {"name": "B", "value": "B"}
                ]
            }]}),
            "Color",
        );
        assert_eq!(out["definitions"]["Color"], json!({"enum": ["A", "B"]}));
    }

    #[test]
    fn enum_with_null_constant_gains_a_null_variant() {
        let out = schema(
            json!({"types": [{
                "kind": "wrapper",
                "name": "Tri",
                "is_enum": true,
                "constants": [
                    {"name": "Unknown", "value": null},
                    {"name": "Yes", "value": true},
                    {"name": "No", "value": false}
                ]
            }]}),
            "Tri",
        );
        assert_eq!(
            out["definitions"]["Tri"],
            json!({"anyOf": [{"type": "null"}, {"enum": [true, false]}]})
        );
    }

    #[test]
    fn mixed_enum_kinds_are_rejected() {
        let err = compile(
            &model(json!({"types": [{
                "kind": "wrapper",
                "name": "Odd",
                "is_enum": true,
                "constants": [
                    {"name": "A", "value": "A"},
                    {"name": "One", "value": 1}
                ]
            }]})),
            "Odd",
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedEnumKind { .. }));
    }

    #[test]
    fn empty_enum_is_rejected() {
        let err = compile(
            &model(json!({"types": [{
                "kind": "wrapper",
                "name": "Void",
                "is_enum": true,
                "constants": [{"name": "Unknown", "value": null}]
            }]})),
            "Void",
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyEnum(_)));
    }

    #[test]
    fn tagged_union_splits_simple_and_complex_variants() {
        let out = schema(
            json!({"types": [{
                "kind": "union",
                "name": "Command",
                "variants": [
                    {"name": "Stop"},
                    {"name": "Move", "fields": [
                        {"name": "x", "type": {"kind": "prim", "prim": "int"}},
                        {"name": "y", "type": {"kind": "prim", "prim": "int"}}
                    ]}
                ]
            }]}),
            "Command",
        );
        let union = &out["definitions"]["Command"]["anyOf"];
        assert_eq!(union[0], json!({"type": "null"}));
        let complex = &union[1];
        assert_eq!(complex["minProperties"], json!(1));
        assert_eq!(
            complex["properties"]["Move"]["required"],
            json!(["x", "y"])
        );
        assert_eq!(union[2], json!({"enum": ["Stop"]}));
    }

    #[test]
    fn unsupported_map_key_registers_nothing() {
        let m = model(json!({"types": [{
            "kind": "struct",
            "name": "Bad",
            "fields": [{"name": "scores", "type": {
                "kind": "map",
                "key": {"kind": "prim", "prim": "float"},
                "value": {"kind": "prim", "prim": "int"}
            }}]
        }]}));
        let mut s = Synthesizer::new(&m);
        let err = s
            .synth(&TypeRef::Named {
                name: "Bad".into(),
                args: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedMapKey { .. }));
        assert!(!s.definitions().has("Map_Float_Int"));
        // The failed struct root is cleaned up too.
        assert!(!s.definitions().has("Bad"));
    }

    #[test]
    fn failed_root_does_not_corrupt_the_next_one() {
        let m = model(json!({"types": [
            {"kind": "struct", "name": "Bad", "fields": [
                {"name": "x", "type": {"kind": "named", "name": "Missing"}}
            ]},
            {"kind": "struct", "name": "Good", "fields": [
                {"name": "x", "type": {"kind": "prim", "prim": "bool"}}
            ]}
        ]}));
        let mut s = Synthesizer::new(&m);
        let bad = TypeRef::Named {
            name: "Bad".into(),
            args: vec![],
        };
        assert!(s.synth(&bad).is_err());
        assert!(s.definitions().is_empty());
        let good = TypeRef::Named {
            name: "Good".into(),
            args: vec![],
        };
        assert!(s.synth(&good).is_ok());
        assert!(s.definitions().lookup("Good").is_some());
    }

    #[test]
    fn recursive_struct_terminates_with_one_definition() {
        let out = schema(
            json!({"types": [{
                "kind": "struct",
                "name": "Node",
                "fields": [{"name": "children", "type": {
                    "kind": "opt",
                    "inner": {"kind": "array", "elem": {"kind": "named", "name": "Node"}}
                }, "optional": true}]
            }]}),
            "Node",
        );
        let defs = out["definitions"].as_object().expect("definitions object");
        assert!(defs.contains_key("Node"));
        assert_eq!(
            out["definitions"]["Array_Node"]["anyOf"][1]["items"],
            json!({"$ref": "#/definitions/Node"})
        );
    }

    #[test]
    fn shared_types_are_defined_once_and_referenced_twice() {
        let out = schema(
            json!({"types": [
                {"kind": "struct", "name": "Point", "fields": [
                    {"name": "x", "type": {"kind": "prim", "prim": "float"}},
                    {"name": "y", "type": {"kind": "prim", "prim": "float"}}
                ]},
                {"kind": "struct", "name": "Segment", "fields": [
                    {"name": "from", "type": {"kind": "named", "name": "Point"}},
                    {"name": "to", "type": {"kind": "named", "name": "Point"}}
                ]}
            ]}),
            "Segment",
        );
        let text = out.to_string();
        assert_eq!(text.matches("\"Point\":").count(), 1);
        let segment = &out["definitions"]["Segment"]["anyOf"][1]["properties"];
        assert_eq!(segment["from"], json!({"$ref": "#/definitions/Point"}));
        assert_eq!(segment["to"], json!({"$ref": "#/definitions/Point"}));
    }

    #[test]
    fn compilation_is_deterministic() {
        let doc = json!({"types": [
            {"kind": "struct", "name": "Envelope", "fields": [
                {"name": "tags", "type": {"kind": "array", "elem": {"kind": "prim", "prim": "string"}}},
                {"name": "meta", "type": {"kind": "map",
                    "key": {"kind": "prim", "prim": "string"},
                    "value": {"kind": "prim", "prim": "int"}}}
            ]}
        ]});
        let a = compile(&model(doc.clone()), "Envelope").expect("first run");
        let b = compile(&model(doc), "Envelope").expect("second run");
        assert_eq!(a, b);
    }

    #[test]
    fn generic_instantiation_names_and_substitutes() {
        let out = schema(
            json!({"types": [
                {"kind": "struct", "name": "Pair", "params": ["T"], "fields": [
                    {"name": "first", "type": {"kind": "var", "var": "T"}},
                    {"name": "second", "type": {"kind": "var", "var": "T"}}
                ]},
                {"kind": "struct", "name": "Holder", "fields": [
                    {"name": "pair", "type": {"kind": "named", "name": "Pair",
                        "args": [{"kind": "prim", "prim": "int"}]}}
                ]}
            ]}),
            "Holder",
        );
        let pair = &out["definitions"]["Pair_Int"]["anyOf"][1];
        assert_eq!(pair["properties"]["first"], json!({"type": "integer"}));
    }

    #[test]
    fn generic_root_is_an_invalid_entry_point() {
        let err = compile(
            &model(json!({"types": [
                {"kind": "struct", "name": "Pair", "params": ["T"], "fields": []}
            ]})),
            "Pair",
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidEntryPoint(_)));
    }

    #[test]
    fn cyclic_aliases_fail_instead_of_recursing() {
        let m = model(json!({"types": [
            {"kind": "alias", "name": "A", "target": {"kind": "named", "name": "B"}},
            {"kind": "alias", "name": "B", "target": {"kind": "named", "name": "A"}}
        ]}));
        let err = compile(&m, "A").unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { .. }));

        let direct = model(json!({"types": [
            {"kind": "alias", "name": "Loop", "target": {"kind": "named", "name": "Loop"}}
        ]}));
        assert!(compile(&direct, "Loop").is_err());

        // A cycle through a container counts too.
        let via_array = model(json!({"types": [
            {"kind": "alias", "name": "Rows",
             "target": {"kind": "array", "elem": {"kind": "named", "name": "Rows"}}}
        ]}));
        assert!(compile(&via_array, "Rows").is_err());
    }

    #[test]
    fn alias_chains_still_resolve_after_cycle_guard() {
        let out = schema(
            json!({"types": [
                {"kind": "alias", "name": "Outer", "target": {"kind": "named", "name": "Inner"}},
                {"kind": "alias", "name": "Inner", "target": {"kind": "prim", "prim": "int"}},
                {"kind": "struct", "name": "Holder", "fields": [
                    {"name": "a", "type": {"kind": "named", "name": "Outer"}},
                    {"name": "b", "type": {"kind": "named", "name": "Outer"}}
                ]}
            ]}),
            "Holder",
        );
        let props = &out["definitions"]["Holder"]["anyOf"][1]["properties"];
        assert_eq!(props["a"], json!({"type": "integer"}));
        assert_eq!(props["b"], json!({"type": "integer"}));
    }

    #[test]
    fn unknown_root_is_an_invalid_entry_point() {
        let err = compile(&model(json!({"types": []})), "Nope").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidEntryPoint(_)));
    }

    #[test]
    fn integer_keyed_map_uses_pattern_properties() {
        let out = schema(
            json!({"types": [{
                "kind": "struct", "name": "Sparse", "fields": [
                    {"name": "cells", "type": {"kind": "map",
                        "key": {"kind": "prim", "prim": "int"},
                        "value": {"kind": "prim", "prim": "string"}}}
                ]
            }]}),
            "Sparse",
        );
        let map = &out["definitions"]["Map_Int_String"]["anyOf"][1];
        assert_eq!(
            map["patternProperties"]["^-?[0-9]+$"],
            json!({"type": "string"})
        );
        assert_eq!(map["additionalProperties"], json!(false));
    }

    #[test]
    fn alias_documentation_rewraps_the_definition() {
        let out = schema(
            json!({"types": [
                {"kind": "alias", "name": "Tags", "doc": "free-form labels",
                 "target": {"kind": "array", "elem": {"kind": "prim", "prim": "string"}}},
                {"kind": "struct", "name": "Item", "fields": [
                    {"name": "tags", "type": {"kind": "named", "name": "Tags"}}
                ]}
            ]}),
            "Item",
        );
        let tags = &out["definitions"]["Tags"];
        assert_eq!(tags["description"], json!("free-form labels"));
        assert!(tags["anyOf"].is_array());
    }

    #[test]
    fn alias_to_primitive_wraps_inline() {
        let out = schema(
            json!({"types": [
                {"kind": "alias", "name": "Count", "doc": "non-negative",
                 "target": {"kind": "prim", "prim": "int"}},
                {"kind": "struct", "name": "Basket", "fields": [
                    {"name": "count", "type": {"kind": "named", "name": "Count"}}
                ]}
            ]}),
            "Basket",
        );
        assert_eq!(
            out["definitions"]["Basket"]["anyOf"][1]["properties"]["count"],
            json!({"type": "integer", "description": "non-negative"})
        );
    }

    #[test]
    fn inherited_fields_are_collected_closest_first() {
        let out = schema(
            json!({"types": [
                {"kind": "struct", "name": "Base", "fields": [
                    {"name": "id", "type": {"kind": "prim", "prim": "int"}},
                    {"name": "label", "type": {"kind": "prim", "prim": "string"}}
                ]},
                {"kind": "struct", "name": "Child",
                 "extends": {"kind": "named", "name": "Base"},
                 "fields": [
                    {"name": "label", "type": {"kind": "prim", "prim": "bool"}}
                ]}
            ]}),
            "Child",
        );
        let child = &out["definitions"]["Child"]["anyOf"][1];
        // The override wins; the inherited copy is not re-added.
        assert_eq!(child["properties"]["label"], json!({"type": "boolean"}));
        assert_eq!(child["properties"]["id"], json!({"type": "integer"}));
    }

    #[test]
    fn ignored_and_computed_fields_are_skipped() {
        let out = schema(
            json!({"types": [{
                "kind": "struct", "name": "View", "fields": [
                    {"name": "kept", "type": {"kind": "prim", "prim": "int"}},
                    {"name": "hidden", "type": {"kind": "prim", "prim": "int"}, "ignored": true},
                    {"name": "derived", "type": {"kind": "prim", "prim": "int"}, "computed": true},
                    {"name": "cached", "type": {"kind": "prim", "prim": "int"}, "computed": true, "stored": true}
                ]
            }]}),
            "View",
        );
        let props = out["definitions"]["View"]["anyOf"][1]["properties"]
            .as_object()
            .expect("properties");
        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["kept", "cached"]);
    }

    #[test]
    fn wrapper_unions_its_conversions() {
        let out = schema(
            json!({"types": [{
                "kind": "wrapper", "name": "StringOrInt", "not_null": true,
                "from": [
                    {"type": {"kind": "prim", "prim": "string"}},
                    {"type": {"kind": "prim", "prim": "int"}}
                ]
            }]}),
            "StringOrInt",
        );
        let def = &out["definitions"]["StringOrInt"]["anyOf"];
        let members = def.as_array().expect("union");
        assert_eq!(members.len(), 2);
        assert!(members.contains(&json!({"type": "string"})));
        assert!(members.contains(&json!({"type": "integer"})));
    }

    #[test]
    fn wrapper_with_unknown_conversions_skips_them() {
        let out = schema(
            json!({"types": [{
                "kind": "wrapper", "name": "Loose", "not_null": true,
                "from": [
                    {"type": {"kind": "named", "name": "NativePointer"}},
                    {"type": {"kind": "prim", "prim": "string"}}
                ]
            }]}),
            "Loose",
        );
        assert_eq!(out["definitions"]["Loose"], json!({"type": "string"}));
    }

    #[test]
    fn wrapper_with_no_resolvable_conversion_fails() {
        let err = compile(
            &model(json!({"types": [{
                "kind": "wrapper", "name": "Opaque",
                "from": [{"type": {"kind": "named", "name": "NativePointer"}}]
            }]})),
            "Opaque",
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::NoJsonRepresentation(_)));
    }

    #[test]
    fn anonymous_records_are_named_structurally() {
        let out = schema(
            json!({"types": [{
                "kind": "struct", "name": "Wrapper", "fields": [
                    {"name": "inner", "type": {"kind": "anon", "fields": [
                        {"name": "x", "type": {"kind": "prim", "prim": "int"}}
                    ]}}
                ]
            }]}),
            "Wrapper",
        );
        assert!(out["definitions"]["Obj_x_Int"]["anyOf"].is_array());
        assert_eq!(
            out["definitions"]["Wrapper"]["anyOf"][1]["properties"]["inner"],
            json!({"$ref": "#/definitions/Obj_x_Int"})
        );
    }
}
