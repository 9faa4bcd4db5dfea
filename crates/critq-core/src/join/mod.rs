//! Join graph model, join strength resolution and join materialization.
//!
//! Join nodes are built once at configuration time and shared by every
//! compilation. Per compilation, [`resolve_join_kinds`] decides how strong
//! each join must be and a [`JoinMaterializer`] turns nodes into backend
//! scans, reusing a scan for every reference to the same node.

mod graph;
mod kind;
mod materialize;

pub use graph::{JoinNode, RelationKind, Relationship};
pub use kind::{resolve_join_kinds, JoinKind};
pub use materialize::JoinMaterializer;
