//! Schema catalog for critq.
//!
//! The catalog stores the entities and relations a backend validates
//! configured join paths and columns against.

mod catalog;
mod entity;
mod relation;

pub use catalog::Catalog;
pub use entity::{EntityDef, FieldDef, ScalarType};
pub use relation::{Cardinality, RelationDef};
