//! Enum and tagged-union encoders.
//!
//! Two distinct shapes share this module: pure-value enumerations (a fixed
//! constant set over one JSON kind) and algebraic tagged unions (named
//! variants with optional payload fields). Draft-07 has no first-class
//! discriminated union, so payload variants become one permissive object
//! keyed by variant name with `minProperties: 1` as the "pick one" sentinel.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::error::{Result, SchemaError};
use crate::fragment::{any_of, nullable, Fragment, Literal};
use crate::model::{Bindings, Field, UnionDecl, WrapperDecl};
use crate::synth::{object, Synthesizer};

/// Encode an algebraic tagged union under `def_name`, guard included
/// (variant payloads may reference the union recursively).
pub(crate) fn encode_union(
    synth: &mut Synthesizer<'_>,
    decl: &UnionDecl,
    bindings: &Bindings,
    def_name: &str,
) -> Result<Fragment> {
    synth.with_placeholder(def_name, |s| {
        let mut variant_objects: IndexMap<String, Fragment> = IndexMap::new();
        let mut simple_values = Vec::new();
        let mut simple_docs = Vec::new();

        for variant in &decl.variants {
            if variant.fields.is_empty() {
                simple_values.push(Literal::Str(variant.name.clone()));
                simple_docs.push(variant.doc.clone().filter(|d| !d.is_empty()));
                continue;
            }
            let fields: Vec<Field> = variant
                .fields
                .iter()
                .map(|f| Field {
                    ty: f.ty.instantiate(bindings),
                    ..f.clone()
                })
                .collect();
            let mut payload = object::encode_record(s, &fields)?;
            if let Some(doc) = variant.doc.as_deref().filter(|d| !d.is_empty()) {
                payload = payload.with_descr(doc);
            }
            variant_objects.insert(variant.name.clone(), payload);
        }

        let mut acc = Fragment::Null;
        if !variant_objects.is_empty() {
            acc = any_of(
                acc,
                Fragment::Object {
                    properties: variant_objects,
                    required: Vec::new(),
                    min_properties: Some(1),
                },
            );
        }
        if !simple_values.is_empty() {
            acc = any_of(
                acc,
                Fragment::Enum {
                    values: simple_values,
                    docs: simple_docs,
                },
            );
        }
        s.defs.fulfil(def_name, acc, decl.doc.as_deref());
        Ok(())
    })?;
    Ok(Fragment::Ref(def_name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumKind {
    Str,
    Num,
    Bool,
}

/// Encode a pure-value enumeration wrapper under `def_name`.
///
/// Constants keep declaration order. A null constant contributes
/// nullability instead of a value; the first non-null constant fixes the
/// kind (int and float share the number bucket, JSON makes no distinction).
pub(crate) fn encode_value_enum(
    synth: &mut Synthesizer<'_>,
    decl: &WrapperDecl,
    def_name: &str,
) -> Result<Fragment> {
    let mut is_nullable = match &decl.repr {
        Some(repr) => synth.model.strip_optional(repr) != *repr,
        None => false,
    };
    let mut kind: Option<EnumKind> = None;
    let mut values = Vec::new();
    let mut docs = Vec::new();

    for constant in &decl.constants {
        let (this_kind, literal) = match &constant.value {
            serde_json::Value::Null => {
                is_nullable = true;
                continue;
            }
            serde_json::Value::Bool(b) => (EnumKind::Bool, Literal::Bool(*b)),
            serde_json::Value::Number(n) => {
                let literal = if let Some(i) = n.as_i64() {
                    Literal::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Literal::Float(OrderedFloat(f))
                } else {
                    return Err(SchemaError::UnsupportedEnumKind {
                        name: decl.name.clone(),
                        detail: format!("constant `{}` is out of numeric range", constant.name),
                    });
                };
                (EnumKind::Num, literal)
            }
            serde_json::Value::String(s) => (EnumKind::Str, Literal::Str(s.clone())),
            _ => {
                return Err(SchemaError::UnsupportedEnumKind {
                    name: decl.name.clone(),
                    detail: format!(
                        "constant `{}` is not a string, number, boolean, or null",
                        constant.name
                    ),
                });
            }
        };
        match kind {
            None => kind = Some(this_kind),
            Some(fixed) if fixed != this_kind => {
                return Err(SchemaError::UnsupportedEnumKind {
                    name: decl.name.clone(),
                    detail: format!(
                        "constant `{}` mixes kinds with earlier constants",
                        constant.name
                    ),
                });
            }
            Some(_) => {}
        }
        values.push(literal);
        docs.push(constant.doc.clone().filter(|d| !d.is_empty()));
    }

    if values.is_empty() {
        return Err(SchemaError::EmptyEnum(decl.name.clone()));
    }

    let mut fragment = Fragment::Enum { values, docs };
    if is_nullable {
        fragment = nullable(fragment);
    }
    synth.defs.fulfil(def_name, fragment, decl.doc.as_deref());
    Ok(Fragment::Ref(def_name.to_string()))
}

// --------------------------------- Tests ---------------------------------- //
