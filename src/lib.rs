//! schemac: compile a typed data-model description into a JSON Schema
//! (draft-07) document.
//!
//! The model (structs, tagged unions, enumeration wrappers, newtype
//! wrappers, aliases, generic containers) is decoded from JSON and walked
//! exactly once per distinct canonical type. Shared and recursive types
//! become named entries in a `definitions` table referenced via `$ref`.
//!
//! Design goals:
//! - One computation per canonical type; recursion terminates through the
//!   registry, never through depth or time limits.
//! - Deterministic output: the same model compiles to byte-identical text.
//! - Fail fast with a closed error taxonomy; no partial schema is ever
//!   emitted and a failed root leaves no registry residue.
pub mod cli;
pub mod error;
pub mod fragment;
pub mod load;
pub mod model;
pub mod registry;
pub mod render;
pub mod synth;

pub use error::SchemaError;
pub use model::Model;
pub use synth::{compile, Synthesizer};
