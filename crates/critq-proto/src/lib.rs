//! critq protocol types.
//!
//! This crate defines the plain data shared by callers and the critq
//! engine: criteria operands, sort lists, query definitions and the logical
//! plan a compiled query is expressed in. Every type is serde-serializable
//! so query definitions can arrive as JSON and plans can be logged.
//!
//! # Modules
//!
//! - [`value`] - Runtime value types for restriction operands and row data
//! - [`criteria`] - Operators and operator/value criteria fields
//! - [`sort`] - Sort identifiers and directions
//! - [`query`] - Per-call query definitions
//! - [`plan`] - Logical query plan IR
//! - [`error`] - Protocol error types

pub mod criteria;
pub mod error;
pub mod plan;
pub mod query;
pub mod sort;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use criteria::{CriteriaField, Operator};
pub use plan::{
    CaseSensitivity, ColumnRef, JoinClause, JoinType, OrderClause, PredicateExpr, ScalarExpr,
    SelectPlan, Selection,
};
pub use query::QueryDefinition;
pub use sort::{SortDirection, SortInfo};
pub use value::Value;
