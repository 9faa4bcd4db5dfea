//! Backend that assembles a [`SelectPlan`] checked against a catalog.

use std::cell::Cell;
use std::sync::Arc;

use critq_proto::{
    CaseSensitivity, JoinClause, JoinType, OrderClause, PredicateExpr, ScalarExpr, SelectPlan,
    Selection, SortDirection, Value,
};
use tracing::trace;

use super::{QueryBackend, ResultKind};
use crate::catalog::Catalog;
use crate::error::Error;
use crate::join::{JoinKind, Relationship};

/// A scan handle: an alias bound to an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanScan {
    alias: String,
    entity: String,
}

impl PlanScan {
    /// Alias of the scan in the plan.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Entity the scan reads.
    pub fn entity(&self) -> &str {
        &self.entity
    }
}

/// A plan under construction.
///
/// Aliases are `<prefix><n>` in the order scans are introduced. The main
/// query uses prefix `t`; each subquery derives its own prefix from its
/// outer query so aliases never collide.
#[derive(Debug)]
pub struct PlanQuery {
    plan: SelectPlan,
    kind: ResultKind,
    prefix: String,
    next_alias: usize,
    subqueries: Cell<usize>,
}

impl PlanQuery {
    fn new(kind: ResultKind, prefix: String, entity: &str) -> (Self, PlanScan) {
        let alias = format!("{}0", prefix);
        let query = Self {
            plan: SelectPlan::new(entity, alias.clone()),
            kind,
            prefix,
            next_alias: 1,
            subqueries: Cell::new(0),
        };
        let scan = PlanScan {
            alias,
            entity: entity.to_string(),
        };
        (query, scan)
    }

    fn allocate_alias(&mut self) -> String {
        let alias = format!("{}{}", self.prefix, self.next_alias);
        self.next_alias += 1;
        alias
    }

    /// Result kind the query was created for.
    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// The plan assembled so far.
    pub fn plan(&self) -> &SelectPlan {
        &self.plan
    }

    /// Finish the query.
    pub fn into_plan(self) -> SelectPlan {
        self.plan
    }
}

/// Reference [`QueryBackend`] producing [`SelectPlan`] values.
///
/// Every entity, relation and column is validated against the catalog, so
/// a misconfigured join path fails at compile time instead of at execution.
#[derive(Debug, Clone)]
pub struct PlanBackend {
    catalog: Arc<Catalog>,
}

impl PlanBackend {
    /// Create a backend over a catalog.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// The catalog names are checked against.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl QueryBackend for PlanBackend {
    type Query = PlanQuery;
    type Scan = PlanScan;
    type Expr = ScalarExpr;
    type Predicate = PredicateExpr;
    type Order = OrderClause;

    fn create_query(
        &self,
        kind: ResultKind,
        root_entity: &str,
    ) -> Result<(PlanQuery, PlanScan), Error> {
        self.catalog.entity(root_entity)?;
        Ok(PlanQuery::new(kind, "t".to_string(), root_entity))
    }

    fn create_subquery(
        &self,
        outer: &PlanQuery,
        root_entity: &str,
    ) -> Result<(PlanQuery, PlanScan), Error> {
        self.catalog.entity(root_entity)?;
        let n = outer.subqueries.get();
        outer.subqueries.set(n + 1);
        let prefix = format!("{}q{}_", outer.prefix, n);
        trace!(prefix = %prefix, entity = root_entity, "created subquery");
        Ok(PlanQuery::new(ResultKind::Entity, prefix, root_entity))
    }

    fn join(
        &self,
        query: &mut PlanQuery,
        parent: &PlanScan,
        relationship: &Relationship,
        target_entity: &str,
        kind: JoinKind,
    ) -> Result<PlanScan, Error> {
        let relation = self
            .catalog
            .relation(&parent.entity, relationship.attribute())?;

        if relation.cardinality.is_to_many() != relationship.is_one_to_many() {
            return Err(Error::CardinalityMismatch {
                entity: parent.entity.clone(),
                relation: relation.name.clone(),
            });
        }
        if relation.to_entity != target_entity {
            return Err(Error::Configuration(format!(
                "relation {}.{} reaches {}, not {}",
                parent.entity, relation.name, relation.to_entity, target_entity
            )));
        }

        let alias = query.allocate_alias();
        query.plan.joins.push(JoinClause {
            alias: alias.clone(),
            parent_alias: parent.alias.clone(),
            relation: relation.name.clone(),
            entity: relation.to_entity.clone(),
            join_type: if kind.inner {
                JoinType::Inner
            } else {
                JoinType::Left
            },
            fetch: kind.fetch,
        });

        Ok(PlanScan {
            alias,
            entity: relation.to_entity.clone(),
        })
    }

    fn column(&self, scan: &PlanScan, column: &str) -> Result<ScalarExpr, Error> {
        self.catalog.check_column(&scan.entity, column)?;
        Ok(ScalarExpr::column(scan.alias.clone(), column))
    }

    fn count(&self, scan: &PlanScan) -> ScalarExpr {
        ScalarExpr::Count {
            alias: scan.alias.clone(),
        }
    }

    fn eq(&self, expr: &ScalarExpr, value: Value) -> PredicateExpr {
        PredicateExpr::Eq {
            expr: expr.clone(),
            value,
        }
    }

    fn ne(&self, expr: &ScalarExpr, value: Value) -> PredicateExpr {
        PredicateExpr::Ne {
            expr: expr.clone(),
            value,
        }
    }

    fn gt(&self, expr: &ScalarExpr, value: Value) -> PredicateExpr {
        PredicateExpr::Gt {
            expr: expr.clone(),
            value,
        }
    }

    fn ge(&self, expr: &ScalarExpr, value: Value) -> PredicateExpr {
        PredicateExpr::Ge {
            expr: expr.clone(),
            value,
        }
    }

    fn lt(&self, expr: &ScalarExpr, value: Value) -> PredicateExpr {
        PredicateExpr::Lt {
            expr: expr.clone(),
            value,
        }
    }

    fn le(&self, expr: &ScalarExpr, value: Value) -> PredicateExpr {
        PredicateExpr::Le {
            expr: expr.clone(),
            value,
        }
    }

    fn is_null(&self, expr: &ScalarExpr) -> PredicateExpr {
        PredicateExpr::IsNull { expr: expr.clone() }
    }

    fn is_not_null(&self, expr: &ScalarExpr) -> PredicateExpr {
        PredicateExpr::IsNotNull { expr: expr.clone() }
    }

    fn like(&self, expr: &ScalarExpr, pattern: String, case: CaseSensitivity) -> PredicateExpr {
        PredicateExpr::Like {
            expr: expr.clone(),
            pattern,
            case,
        }
    }

    fn in_subquery(&self, expr: &ScalarExpr, subquery: PlanQuery) -> PredicateExpr {
        PredicateExpr::InSubquery {
            expr: expr.clone(),
            subquery: Box::new(subquery.into_plan()),
        }
    }

    fn not(&self, predicate: PredicateExpr) -> PredicateExpr {
        PredicateExpr::Not(Box::new(predicate))
    }

    fn and(&self, mut predicates: Vec<PredicateExpr>) -> PredicateExpr {
        if predicates.len() == 1 {
            if let Some(single) = predicates.pop() {
                return single;
            }
        }
        PredicateExpr::And(predicates)
    }

    fn asc(&self, expr: &ScalarExpr) -> OrderClause {
        OrderClause {
            expr: expr.clone(),
            direction: SortDirection::Asc,
        }
    }

    fn desc(&self, expr: &ScalarExpr) -> OrderClause {
        OrderClause {
            expr: expr.clone(),
            direction: SortDirection::Desc,
        }
    }

    fn select(&self, query: &mut PlanQuery, expr: ScalarExpr) {
        query.plan.selection = Selection::Expr(expr);
    }

    fn filter(&self, query: &mut PlanQuery, predicate: PredicateExpr) {
        query.plan.filter = Some(predicate);
    }

    fn order_by(&self, query: &mut PlanQuery, orders: Vec<OrderClause>) {
        query.plan.order_by = orders;
    }
}
