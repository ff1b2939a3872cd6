//! In-memory schema fragments and the union merger.
//!
//! A fragment is the value the synthesis engine builds and the registry
//! stores; rendering to JSON Schema text happens once, at the end, in
//! `render`. The only algebra here is `any_of`: a flattened union
//! constructor whose most common call shape is `any_of(Null, body)`.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::model::Prim;

/// A literal constant inside an `Enum` fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(OrderedFloat<f64>),
    Bool(bool),
}

/// One schema fragment; closed union, immutable once registered (the single
/// exception is the documentation rewrap in the registry).
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Simple(Prim),
    /// Matches exactly the JSON null value.
    Null,
    /// Ordered union; order is deterministic-output only, never semantic.
    AnyOf(Vec<Fragment>),
    Array(Box<Fragment>),
    Object {
        properties: IndexMap<String, Fragment>,
        required: Vec<String>,
        /// `Some(1)` is the tagged-union sentinel: at least one
        /// variant-named property must be present.
        min_properties: Option<usize>,
    },
    Map {
        int_keys: bool,
        value: Box<Fragment>,
    },
    /// Fixed constant set; `docs` is parallel to `values`.
    Enum {
        values: Vec<Literal>,
        docs: Vec<Option<String>>,
    },
    /// Indirection to a named definition.
    Ref(String),
    /// Documentation attachment; no validation meaning.
    WithDescr {
        inner: Box<Fragment>,
        text: String,
    },
}

impl Fragment {
    pub fn object(properties: IndexMap<String, Fragment>, required: Vec<String>) -> Fragment {
        Fragment::Object {
            properties,
            required,
            min_properties: None,
        }
    }

    pub fn with_descr(self, text: impl Into<String>) -> Fragment {
        Fragment::WithDescr {
            inner: Box::new(self),
            text: text.into(),
        }
    }
}

/// Merge two fragments into a flattened union. First match wins:
///
/// 1. null joined onto a union that already has a null variant is a no-op;
/// 2. two unions concatenate;
/// 3. a single union absorbs the other side;
/// 4. anything else becomes a fresh two-element union.
///
/// Duplicate non-null variants are permitted; registry-level deduplication
/// already prevents most redundancy.
pub fn any_of(a: Fragment, b: Fragment) -> Fragment {
    fn has_null(items: &[Fragment]) -> bool {
        items.iter().any(|f| matches!(f, Fragment::Null))
    }
    match (a, b) {
        (Fragment::Null, Fragment::AnyOf(items)) if has_null(&items) => Fragment::AnyOf(items),
        (Fragment::AnyOf(items), Fragment::Null) if has_null(&items) => Fragment::AnyOf(items),
        (Fragment::AnyOf(mut xs), Fragment::AnyOf(ys)) => {
            xs.extend(ys);
            Fragment::AnyOf(xs)
        }
        (Fragment::AnyOf(mut xs), b) => {
            xs.push(b);
            Fragment::AnyOf(xs)
        }
        (a, Fragment::AnyOf(mut ys)) => {
            ys.push(a);
            Fragment::AnyOf(ys)
        }
        (a, b) => Fragment::AnyOf(vec![a, b]),
    }
}

/// The pervasive call shape: wrap a body as nullable.
pub fn nullable(body: Fragment) -> Fragment {
    any_of(Fragment::Null, body)
}

// --------------------------------- Tests ---------------------------------- //
