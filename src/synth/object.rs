//! Structural object encoder: structs, inherited fields, anonymous records.

use indexmap::IndexMap;

use crate::error::{Result, SchemaError};
use crate::fragment::{nullable, Fragment};
use crate::model::{bind, Bindings, Decl, Field, Model, StructDecl, TypeRef};
use crate::synth::Synthesizer;

const MAX_CHAIN: usize = 64;

/// Encode a struct declaration under `def_name`, guard included.
pub(crate) fn encode_struct(
    synth: &mut Synthesizer<'_>,
    decl: &StructDecl,
    bindings: &Bindings,
    def_name: &str,
) -> Result<Fragment> {
    let fields = collect_fields(synth.model, decl, bindings)?;
    synth.with_placeholder(def_name, |s| {
        let body = encode_record(s, &fields)?;
        s.defs.fulfil(def_name, nullable(body), decl.doc.as_deref());
        Ok(())
    })?;
    Ok(Fragment::Ref(def_name.to_string()))
}

/// Encode an anonymous structural record under its canonical `Obj_…` name.
pub(crate) fn encode_anon(
    synth: &mut Synthesizer<'_>,
    fields: &[Field],
    def_name: &str,
) -> Result<Fragment> {
    synth.with_placeholder(def_name, |s| {
        let body = encode_record(s, fields)?;
        s.defs.fulfil(def_name, nullable(body), None);
        Ok(())
    })?;
    Ok(Fragment::Ref(def_name.to_string()))
}

/// Shared record body: required-vs-optional partition, field docs, skips.
/// Field types must already be instantiated. Used by structs, anonymous
/// records, and tagged-union variant payloads.
pub(crate) fn encode_record(synth: &mut Synthesizer<'_>, fields: &[Field]) -> Result<Fragment> {
    let mut properties = IndexMap::new();
    let mut required = Vec::new();
    for field in fields {
        if field.ignored {
            continue;
        }
        if field.computed && !field.stored {
            continue;
        }
        if !field.optional {
            required.push(field.name.clone());
        }
        let mut schema = synth.synth(&field.ty)?;
        if let Some(doc) = field.doc.as_deref().filter(|d| !d.is_empty()) {
            schema = schema.with_descr(doc);
        }
        properties.insert(field.name.clone(), schema);
    }
    Ok(Fragment::object(properties, required))
}

/// Full field list in closest-declared-first order: own fields, then each
/// ancestor up the supertype chain, skipping names already collected.
/// Every level's field types are instantiated against that level's
/// bindings.
fn collect_fields(model: &Model, decl: &StructDecl, bindings: &Bindings) -> Result<Vec<Field>> {
    let mut out: Vec<Field> = Vec::new();
    let mut cur_decl = decl;
    let mut cur_bindings = bindings.clone();
    let mut depth = 0usize;
    loop {
        for field in &cur_decl.fields {
            if out.iter().any(|seen| seen.name == field.name) {
                continue;
            }
            out.push(Field {
                ty: field.ty.instantiate(&cur_bindings),
                ..field.clone()
            });
        }
        let Some(parent) = &cur_decl.extends else {
            return Ok(out);
        };
        depth += 1;
        if depth > MAX_CHAIN {
            return Err(SchemaError::UnsupportedType {
                name: decl.name.clone(),
                reason: "supertype chain does not terminate".to_string(),
            });
        }
        let parent = parent.instantiate(&cur_bindings);
        let (next_decl, next_bindings) = resolve_parent(model, &parent)?;
        cur_decl = next_decl;
        cur_bindings = next_bindings;
    }
}

/// Resolve a supertype reference to its struct declaration, through alias
/// chains.
fn resolve_parent<'m>(model: &'m Model, ty: &TypeRef) -> Result<(&'m StructDecl, Bindings)> {
    let mut cur = ty.clone();
    let mut hops = 0usize;
    loop {
        let TypeRef::Named { name, args } = &cur else {
            return Err(SchemaError::UnsupportedType {
                name: ty.canonical_name(),
                reason: "supertype is not a struct".to_string(),
            });
        };
        match model.get(name) {
            Some(Decl::Struct(parent)) => {
                if parent.params.len() != args.len() {
                    return Err(SchemaError::InvalidEntryPoint(format!(
                        "`{name}` expects {} type argument(s), got {}",
                        parent.params.len(),
                        args.len()
                    )));
                }
                return Ok((parent, bind(&parent.params, args)));
            }
            Some(Decl::Alias(_)) => match model.alias_step(&cur) {
                Some(next) if hops < MAX_CHAIN => {
                    hops += 1;
                    cur = next;
                }
                _ => {
                    return Err(SchemaError::UnsupportedType {
                        name: ty.canonical_name(),
                        reason: "supertype alias does not resolve to a struct".to_string(),
                    })
                }
            },
            _ => {
                return Err(SchemaError::UnsupportedType {
                    name: name.clone(),
                    reason: "supertype is not a struct".to_string(),
                })
            }
        }
    }
}

// --------------------------------- Tests ---------------------------------- //
