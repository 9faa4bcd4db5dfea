//! Query backend contract.
//!
//! The engine never builds queries itself. It drives a [`QueryBackend`],
//! which owns the concrete query, scan, expression, predicate and order
//! types. [`PlanBackend`] is the reference implementation producing a
//! [`critq_proto::SelectPlan`].

mod plan;

pub use plan::{PlanBackend, PlanQuery, PlanScan};

use critq_proto::{CaseSensitivity, Value};

use crate::error::Error;
use crate::join::{JoinKind, Relationship};

/// Shape of a query's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    /// A single row count.
    Count,
    /// Whole rows of the root entity.
    Entity,
}

/// Capabilities the engine needs from a query builder.
///
/// Handles are owned by one compilation and never shared across calls.
pub trait QueryBackend {
    /// A query under construction.
    type Query;
    /// A root scan or join handle.
    type Scan: Clone;
    /// A path or scalar expression.
    type Expr: Clone;
    /// A filter predicate.
    type Predicate;
    /// An order clause.
    type Order;

    /// Create a query and its root scan of `root_entity`.
    fn create_query(
        &self,
        kind: ResultKind,
        root_entity: &str,
    ) -> Result<(Self::Query, Self::Scan), Error>;

    /// Create a subquery scoped to `outer` with its own root scan.
    fn create_subquery(
        &self,
        outer: &Self::Query,
        root_entity: &str,
    ) -> Result<(Self::Query, Self::Scan), Error>;

    /// Join `target_entity` to `parent` over `relationship`.
    fn join(
        &self,
        query: &mut Self::Query,
        parent: &Self::Scan,
        relationship: &Relationship,
        target_entity: &str,
        kind: JoinKind,
    ) -> Result<Self::Scan, Error>;

    /// Resolve a column of a scan.
    fn column(&self, scan: &Self::Scan, column: &str) -> Result<Self::Expr, Error>;

    /// Row count of a scan.
    fn count(&self, scan: &Self::Scan) -> Self::Expr;

    /// `expr = value`
    fn eq(&self, expr: &Self::Expr, value: Value) -> Self::Predicate;
    /// `expr <> value`
    fn ne(&self, expr: &Self::Expr, value: Value) -> Self::Predicate;
    /// `expr > value`
    fn gt(&self, expr: &Self::Expr, value: Value) -> Self::Predicate;
    /// `expr >= value`
    fn ge(&self, expr: &Self::Expr, value: Value) -> Self::Predicate;
    /// `expr < value`
    fn lt(&self, expr: &Self::Expr, value: Value) -> Self::Predicate;
    /// `expr <= value`
    fn le(&self, expr: &Self::Expr, value: Value) -> Self::Predicate;
    /// `expr IS NULL`
    fn is_null(&self, expr: &Self::Expr) -> Self::Predicate;
    /// `expr IS NOT NULL`
    fn is_not_null(&self, expr: &Self::Expr) -> Self::Predicate;

    /// LIKE pattern match; `Insensitive` lower-cases `expr` first.
    fn like(&self, expr: &Self::Expr, pattern: String, case: CaseSensitivity) -> Self::Predicate;

    /// `expr IN (subquery)`
    fn in_subquery(&self, expr: &Self::Expr, subquery: Self::Query) -> Self::Predicate;

    /// Negate a predicate.
    fn not(&self, predicate: Self::Predicate) -> Self::Predicate;

    /// Conjunction of predicates. An empty list is always true.
    fn and(&self, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    /// Ascending order on an expression.
    fn asc(&self, expr: &Self::Expr) -> Self::Order;

    /// Descending order on an expression.
    fn desc(&self, expr: &Self::Expr) -> Self::Order;

    /// Set the query's selection.
    fn select(&self, query: &mut Self::Query, expr: Self::Expr);

    /// Set the query's filter.
    fn filter(&self, query: &mut Self::Query, predicate: Self::Predicate);

    /// Set the query's order clauses, primary first.
    fn order_by(&self, query: &mut Self::Query, orders: Vec<Self::Order>);
}

/// Per-call context handed to predicate builders.
///
/// Carries the backend, the query being assembled and the resolved path of
/// the restricted column.
pub struct QueryContext<'a, B: QueryBackend> {
    backend: &'a B,
    query: &'a B::Query,
    path: B::Expr,
}

impl<'a, B: QueryBackend> QueryContext<'a, B> {
    /// Create a context.
    pub fn new(backend: &'a B, query: &'a B::Query, path: B::Expr) -> Self {
        Self {
            backend,
            query,
            path,
        }
    }

    /// The backend building the query.
    pub fn backend(&self) -> &'a B {
        self.backend
    }

    /// The query being assembled.
    pub fn query(&self) -> &'a B::Query {
        self.query
    }

    /// Resolved path of the restricted column.
    pub fn path(&self) -> &B::Expr {
        &self.path
    }
}
