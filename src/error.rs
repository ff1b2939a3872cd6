//! Closed error taxonomy for the synthesis engine.
//!
//! Every variant is fatal for the current root: no partial or default
//! schema is ever substituted. The registry guard guarantees a failed root
//! leaves nothing behind, so a caller may try a different root on the same
//! synthesizer afterwards.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The type matches none of the supported classifications.
    #[error("no schema can be produced for `{name}`: {reason}")]
    UnsupportedType { name: String, reason: String },

    /// Map keys must resolve to the string or integer primitive.
    #[error("unsupported map key type `{key}` in `{map}`: keys must be string-like or integer-like")]
    UnsupportedMapKey { map: String, key: String },

    /// A wrapper declared no resolvable underlying representation.
    #[error("abstract type `{0}` has no JSON representation")]
    NoJsonRepresentation(String),

    /// Enum constants must all be of one representable kind.
    #[error("enum `{name}` has an unsupported constant kind: {detail}")]
    UnsupportedEnumKind { name: String, detail: String },

    /// An enumeration wrapper with zero usable constants.
    #[error("enum `{0}` declares no usable constants")]
    EmptyEnum(String),

    /// The compilation was pointed at something that is not a single
    /// concrete type: unknown root, generic root, missing type argument.
    #[error("invalid entry point: {0}")]
    InvalidEntryPoint(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
