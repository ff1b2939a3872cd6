//! Newtype/abstract encoder: a wrapper as the union of its convertible
//! representations.

use crate::error::{Result, SchemaError};
use crate::fragment::{any_of, Fragment};
use crate::model::{Bindings, TypeRef, WrapperDecl};
use crate::synth::Synthesizer;

/// Encode a non-enum wrapper under `def_name`, guard included (a
/// conversion may name the wrapper itself).
///
/// Conversions default to the wrapper's single runtime representation when
/// none are declared. A conversion naming an unknown type is skipped; any
/// other synthesis failure propagates. Zero resolvable conversions is
/// `NoJsonRepresentation`.
pub(crate) fn encode_wrapper(
    synth: &mut Synthesizer<'_>,
    decl: &WrapperDecl,
    bindings: &Bindings,
    def_name: &str,
) -> Result<Fragment> {
    synth.with_placeholder(def_name, |s| {
        let declared: Vec<TypeRef> = if decl.from.is_empty() {
            decl.repr.iter().cloned().collect()
        } else {
            decl.from.iter().map(|c| c.ty.clone()).collect()
        };

        let mut any_nullable = false;
        let mut resolved = Vec::new();
        for conversion in &declared {
            let conversion = conversion.instantiate(bindings);
            if let TypeRef::Named { name, .. } = &conversion {
                if s.model.get(name).is_none() {
                    continue;
                }
            }
            any_nullable |= s.model.admits_null(&conversion);
            resolved.push(s.synth(&conversion)?);
        }

        if resolved.is_empty() {
            return Err(SchemaError::NoJsonRepresentation(decl.name.clone()));
        }

        // Seed with null when any representation is nullable, else with the
        // last-resolved schema; a lone non-nullable conversion stays bare.
        let mut acc = if any_nullable {
            Fragment::Null
        } else {
            resolved
                .pop()
                .ok_or_else(|| SchemaError::NoJsonRepresentation(decl.name.clone()))?
        };
        for schema in resolved {
            acc = any_of(acc, schema);
        }
        s.defs.fulfil(def_name, acc, decl.doc.as_deref());
        Ok(())
    })?;
    Ok(Fragment::Ref(def_name.to_string()))
}

// --------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use serde_json::json;

    fn model(doc: serde_json::Value) -> Model {
        serde_json::from_value(doc).expect("test model decodes")
    }

    fn synth_named(m: &Model, name: &str) -> Result<Fragment> {
        let mut s = Synthesizer::new(m);
        let out = s.synth(&TypeRef::Named {
            name: name.into(),
            args: vec![],
        });
        out.map(|fragment| match fragment {
            Fragment::Ref(def) => s.definitions().lookup(&def).cloned().expect("registered"),
            other => other,
        })
    }

    #[test]
    fn lone_non_nullable_conversion_stays_bare() {
        let m = model(json!({"types": [{
            "kind": "wrapper", "name": "UserId",
            "repr": {"kind": "prim", "prim": "int"}
        }]}));
        assert_eq!(
            synth_named(&m, "UserId").expect("compiles"),
            Fragment::Simple(crate::model::Prim::Int)
        );
    }

    #[test]
    fn nullable_conversion_seeds_the_union_with_null() {
        let m = model(json!({"types": [{
            "kind": "wrapper", "name": "MaybeName",
            "from": [{"type": {"kind": "opt", "inner": {"kind": "prim", "prim": "string"}}}]
        }]}));
        let Fragment::AnyOf(items) = synth_named(&m, "MaybeName").expect("compiles") else {
            panic!("expected a union");
        };
        assert_eq!(items[0], Fragment::Null);
        let nulls = items
            .iter()
            .filter(|f| matches!(f, Fragment::Null))
            .count();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn self_referential_conversion_terminates() {
        let m = model(json!({"types": [{
            "kind": "wrapper", "name": "Nested", "not_null": true,
            "from": [
                {"type": {"kind": "prim", "prim": "string"}},
                {"type": {"kind": "named", "name": "Nested"}}
            ]
        }]}));
        let fragment = synth_named(&m, "Nested").expect("terminates");
        let rendered = crate::render::fragment_value(&fragment).to_string();
        assert!(rendered.contains("#/definitions/Nested"));
    }

    #[test]
    fn generic_wrapper_instantiates_conversions() {
        let m = model(json!({"types": [
            {"kind": "wrapper", "name": "Boxed", "params": ["T"],
             "from": [{"type": {"kind": "var", "var": "T"}}]},
            {"kind": "struct", "name": "Root", "fields": [
                {"name": "value", "type": {"kind": "named", "name": "Boxed",
                    "args": [{"kind": "prim", "prim": "bool"}]}}
            ]}
        ]}));
        let mut s = Synthesizer::new(&m);
        s.synth(&TypeRef::Named {
            name: "Root".into(),
            args: vec![],
        })
        .expect("compiles");
        assert_eq!(
            s.definitions().lookup("Boxed_Bool"),
            Some(&Fragment::Simple(crate::model::Prim::Bool))
        );
    }
}
