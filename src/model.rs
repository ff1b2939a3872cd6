//! Input contract: the explicit, serde-decoded type graph.
//!
//! The synthesis engine never touches a live reflection API; it walks this
//! in-memory description instead. A model is a flat list of declarations
//! (structs, tagged unions, wrappers, aliases) plus the `TypeRef` tree that
//! fields, variants and conversions use to point at each other.
//!
//! This module also owns the two type-level judgements the engine needs
//! everywhere: optional-layer stripping and the permissive nullability
//! default, plus canonical naming (the registry key).

use indexmap::IndexMap;
use serde::Deserialize;

// ------------------------------- Type refs -------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prim {
    String,
    Int,
    Float,
    Bool,
}

impl Prim {
    pub fn canonical(self) -> &'static str {
        match self {
            Prim::String => "String",
            Prim::Int => "Int",
            Prim::Float => "Float",
            Prim::Bool => "Bool",
        }
    }
}

/// A reference to a type, as it appears in field/variant/conversion position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeRef {
    /// One of the four JSON-representable primitives.
    Prim { prim: Prim },
    /// Homogeneous ordered container.
    Array { elem: Box<TypeRef> },
    /// Associative container; the key must resolve to string or int.
    Map { key: Box<TypeRef>, value: Box<TypeRef> },
    /// The designated optional wrapper.
    Opt { inner: Box<TypeRef> },
    /// A declared type, possibly applied to arguments.
    Named {
        name: String,
        #[serde(default)]
        args: Vec<TypeRef>,
    },
    /// A free type parameter; meaningful only under a binding.
    Var { var: String },
    /// An anonymous structural record.
    Anon { fields: Vec<Field> },
}

pub type Bindings = IndexMap<String, TypeRef>;

impl TypeRef {
    /// Substitute bound type variables. Unknown variables are left in place
    /// (they surface later as `UnsupportedType`).
    pub fn instantiate(&self, bindings: &Bindings) -> TypeRef {
        match self {
            TypeRef::Prim { .. } => self.clone(),
            TypeRef::Array { elem } => TypeRef::Array {
                elem: Box::new(elem.instantiate(bindings)),
            },
            TypeRef::Map { key, value } => TypeRef::Map {
                key: Box::new(key.instantiate(bindings)),
                value: Box::new(value.instantiate(bindings)),
            },
            TypeRef::Opt { inner } => TypeRef::Opt {
                inner: Box::new(inner.instantiate(bindings)),
            },
            TypeRef::Named { name, args } => TypeRef::Named {
                name: name.clone(),
                args: args.iter().map(|a| a.instantiate(bindings)).collect(),
            },
            TypeRef::Var { var } => match bindings.get(var) {
                Some(bound) => bound.clone(),
                None => self.clone(),
            },
            TypeRef::Anon { fields } => TypeRef::Anon {
                fields: fields
                    .iter()
                    .map(|f| Field {
                        ty: f.ty.instantiate(bindings),
                        ..f.clone()
                    })
                    .collect(),
            },
        }
    }

    /// The deterministic registry key for this reference.
    ///
    /// Generic arguments recurse: a map from Int to V is `Map_Int_V`. Dots
    /// in declared names (module paths) become underscores.
    pub fn canonical_name(&self) -> String {
        match self {
            TypeRef::Prim { prim } => prim.canonical().to_string(),
            TypeRef::Array { elem } => format!("Array_{}", elem.canonical_name()),
            TypeRef::Map { key, value } => {
                format!("Map_{}_{}", key.canonical_name(), value.canonical_name())
            }
            TypeRef::Opt { inner } => format!("Null_{}", inner.canonical_name()),
            TypeRef::Named { name, args } => {
                let mut out = name.replace('.', "_");
                for arg in args {
                    out.push('_');
                    out.push_str(&arg.canonical_name());
                }
                out
            }
            TypeRef::Var { var } => var.clone(),
            TypeRef::Anon { fields } => {
                let mut out = String::from("Obj");
                for f in fields {
                    out.push('_');
                    out.push_str(&f.name);
                    out.push('_');
                    out.push_str(&f.ty.canonical_name());
                }
                out
            }
        }
    }
}

// ------------------------------ Declarations ------------------------------ //

/// One declared field of a struct, anonymous record, or union variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub doc: Option<String>,
    /// Not added to the `required` set.
    #[serde(default)]
    pub optional: bool,
    /// Excluded from the schema entirely.
    #[serde(default)]
    pub ignored: bool,
    /// A computed accessor with no backing storage (skipped unless `stored`).
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub stored: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
    /// Head of the supertype chain, walked transitively.
    #[serde(default)]
    pub extends: Option<TypeRef>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    /// Empty = argument-less ("simple") variant.
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
    pub variants: Vec<Variant>,
}

/// A declared "from" conversion of a wrapper type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Conversion {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Optional field selector on the source value; carried for diagnostics,
    /// irrelevant to the shape of the schema.
    #[serde(default)]
    pub field: Option<String>,
}

/// One constant of an enumeration wrapper. The literal is decoded as raw
/// JSON and classified by the enum encoder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Constant {
    pub name: String,
    pub value: serde_json::Value,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WrapperDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
    /// Declared convertible representations; defaults to `repr` when empty.
    #[serde(default)]
    pub from: Vec<Conversion>,
    /// The single runtime representation.
    #[serde(default)]
    pub repr: Option<TypeRef>,
    /// Explicit "never null" annotation.
    #[serde(default)]
    pub not_null: bool,
    /// Marks the wrapper as an enumeration of constants.
    #[serde(default)]
    pub is_enum: bool,
    #[serde(default)]
    pub constants: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AliasDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
    pub target: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Decl {
    Struct(StructDecl),
    Union(UnionDecl),
    Wrapper(WrapperDecl),
    Alias(AliasDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Struct(d) => &d.name,
            Decl::Union(d) => &d.name,
            Decl::Wrapper(d) => &d.name,
            Decl::Alias(d) => &d.name,
        }
    }

    pub fn params(&self) -> &[String] {
        match self {
            Decl::Struct(d) => &d.params,
            Decl::Union(d) => &d.params,
            Decl::Wrapper(d) => &d.params,
            Decl::Alias(d) => &d.params,
        }
    }
}

// --------------------------------- Model ---------------------------------- //

/// The full type graph for one compilation run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Model {
    pub types: Vec<Decl>,
}

impl Model {
    pub fn get(&self, name: &str) -> Option<&Decl> {
        self.types.iter().find(|d| d.name() == name)
    }

    /// Resolve one alias step, instantiated against the alias's arguments.
    /// `None` when `ty` is not a reference to an alias.
    pub(crate) fn alias_step(&self, ty: &TypeRef) -> Option<TypeRef> {
        let TypeRef::Named { name, args } = ty else {
            return None;
        };
        let Some(Decl::Alias(alias)) = self.get(name) else {
            return None;
        };
        if alias.params.len() != args.len() {
            return None;
        }
        let bindings = bind(&alias.params, args);
        Some(alias.target.instantiate(&bindings))
    }

    /// Repeatedly unwrap the optional wrapper, following alias chains that
    /// resolve to an optional layer. Idempotent; a type with no optional
    /// layer comes back unchanged (aliases that do not lead to an optional
    /// layer keep their own identity).
    pub fn strip_optional(&self, ty: &TypeRef) -> TypeRef {
        let mut cur = ty.clone();
        loop {
            match cur {
                TypeRef::Opt { inner } => cur = *inner,
                ref other => {
                    // Probe alias chains only as far as they lead to an
                    // optional layer; bail on cycles.
                    let mut probe = other.clone();
                    let mut hops = 0usize;
                    loop {
                        match self.alias_step(&probe) {
                            Some(next) if hops < 64 => {
                                hops += 1;
                                if let TypeRef::Opt { inner } = next {
                                    return self.strip_optional(&inner);
                                }
                                probe = next;
                            }
                            _ => return other.clone(),
                        }
                    }
                }
            }
        }
    }

    /// Whether the type admits a JSON null.
    ///
    /// Permissive by default: a false "nullable" merely widens the schema,
    /// while a false "non-nullable" would reject real values. Primitives
    /// are the one carve-out (a definite non-null representation); wrappers
    /// opt out with `not_null`; aliases are transparent.
    pub fn admits_null(&self, ty: &TypeRef) -> bool {
        if self.strip_optional(ty) != *ty {
            return true;
        }
        match ty {
            TypeRef::Prim { .. } => false,
            TypeRef::Named { name, .. } => match self.get(name) {
                Some(Decl::Wrapper(w)) => !w.not_null,
                Some(Decl::Alias(_)) => match self.alias_step(ty) {
                    Some(target) => self.admits_null(&target),
                    None => true,
                },
                _ => true,
            },
            _ => true,
        }
    }
}

/// Pair up declared parameters with concrete arguments.
pub fn bind(params: &[String], args: &[TypeRef]) -> Bindings {
    params.iter().cloned().zip(args.iter().cloned()).collect()
}

// --------------------------------- Tests ---------------------------------- //
