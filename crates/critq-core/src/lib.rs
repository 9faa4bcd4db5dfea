//! critq core - join graph resolution, restriction assembly and one-to-many
//! subquery promotion for criteria queries.
//!
//! Callers describe what to search for with a criteria record and a list of
//! sort identifiers. A [`CriteriaQueryHandler`] compiles that description
//! into a count query and an entity query through a [`QueryBackend`],
//! deriving the joins, their strength, the filter predicates and the
//! membership subqueries that keep to-many joins from multiplying rows.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod exec;
pub mod handler;
pub mod handlers;
pub mod join;
pub mod operation;
pub mod restriction;
pub mod sort;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{PlanBackend, PlanQuery, PlanScan, QueryBackend, QueryContext, ResultKind};
pub use catalog::{Cardinality, Catalog, EntityDef, FieldDef, RelationDef, ScalarType};
pub use config::{CompileOptions, HandlerConfig, UnknownSortPolicy};
pub use error::Error;
pub use exec::{EntityRow, MemoryStore, PlanExecutor, QueryOutput, SubqueryMembers};
pub use handler::{CriteriaQueryHandler, QueryHandler};
pub use join::{resolve_join_kinds, JoinKind, JoinMaterializer, JoinNode, RelationKind, Relationship};
pub use restriction::{
    predicate_builder, AppliedRestriction, PredicateBuilder, Restriction, RestrictionDefinition,
    RestrictionMapping, RestrictionValue,
};
pub use sort::SortDefinition;

/// Re-export protocol types.
pub use critq_proto as proto;
