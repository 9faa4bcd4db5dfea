//! Core error types.

use critq_proto::Operator;
use thiserror::Error;

/// Errors raised while configuring, compiling or executing queries.
#[derive(Debug, Error)]
pub enum Error {
    /// An operator was used with a builder that cannot express it.
    #[error("unsupported operator {operator} for {operand} operand")]
    UnsupportedOperator {
        /// The rejected operator.
        operator: Operator,
        /// Operand family the builder handles.
        operand: &'static str,
    },

    /// Entity is not declared in the catalog.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// Relation is not declared on the entity.
    #[error("unknown relation {relation} on entity {entity}")]
    UnknownRelation {
        /// Entity the relation was looked up on.
        entity: String,
        /// Relation name.
        relation: String,
    },

    /// Column is not declared on the entity.
    #[error("unknown column {column} on entity {entity}")]
    UnknownColumn {
        /// Entity the column was looked up on.
        entity: String,
        /// Column name.
        column: String,
    },

    /// A relationship's declared shape disagrees with the catalog.
    #[error("relation {relation} on entity {entity} does not match its declared cardinality")]
    CardinalityMismatch {
        /// Entity owning the relation.
        entity: String,
        /// Relation name.
        relation: String,
    },

    /// A sort identifier has no configured sort.
    #[error("unknown sort: {0}")]
    UnknownSort(String),

    /// Invalid handler or join configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A plan could not be evaluated.
    #[error("execution error: {0}")]
    Execution(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] critq_proto::Error),
}
