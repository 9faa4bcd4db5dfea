//! Plan executor over a [`MemoryStore`].

use critq_proto::{JoinType, ScalarExpr, SelectPlan, Selection, Value};
use serde::Serialize;
use tracing::{debug, trace};

use super::evaluate::{PredicateEvaluator, RowBinding, SubqueryMembers};
use super::store::{EntityRow, MemoryStore};
use crate::catalog::Catalog;
use crate::error::Error;

/// Result of executing a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QueryOutput {
    /// Rows of the selected entity, one per joined row.
    Entities(Vec<EntityRow>),
    /// Number of joined rows.
    Count(u64),
    /// Values of the selected expression, one per joined row.
    Values(Vec<Value>),
}

/// Executes plans against in-memory rows.
///
/// Joins follow the catalog relation: a parent row matches every target row
/// whose `to_field` equals the parent's `from_field`. Fetch flags do not
/// change the rows produced.
pub struct PlanExecutor<'a> {
    catalog: &'a Catalog,
    store: &'a MemoryStore,
}

impl<'a> PlanExecutor<'a> {
    /// Create a new executor with catalog and store references.
    pub fn new(catalog: &'a Catalog, store: &'a MemoryStore) -> Self {
        Self { catalog, store }
    }

    /// Execute a plan.
    pub fn execute(&self, plan: &SelectPlan) -> Result<QueryOutput, Error> {
        let mut bindings = self.join_rows(plan)?;
        let joined = bindings.len();

        if let Some(filter) = &plan.filter {
            let mut subquery = SubqueryMembers::new(|sub: &SelectPlan| self.values(sub));
            let mut kept = Vec::with_capacity(bindings.len());
            for binding in bindings {
                if PredicateEvaluator::evaluate(filter, &binding, &mut subquery)? {
                    kept.push(binding);
                }
            }
            trace!(subqueries = subquery.loaded(), "filtered joined rows");
            bindings = kept;
        }

        if !plan.order_by.is_empty() {
            let mut keyed = bindings
                .into_iter()
                .map(|binding| {
                    let keys = plan
                        .order_by
                        .iter()
                        .map(|order| binding.scalar(&order.expr))
                        .collect::<Result<Vec<_>, Error>>()?;
                    Ok((keys, binding))
                })
                .collect::<Result<Vec<_>, Error>>()?;

            keyed.sort_by(|(a, _), (b, _)| {
                plan.order_by
                    .iter()
                    .zip(a.iter().zip(b.iter()))
                    .map(|(order, (x, y))| PredicateEvaluator::sort_order(x, y, order.direction))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            bindings = keyed.into_iter().map(|(_, binding)| binding).collect();
        }

        debug!(
            root = %plan.root_entity,
            joined,
            matched = bindings.len(),
            "executed plan"
        );

        match &plan.selection {
            Selection::Entity { alias } => {
                let mut rows = Vec::with_capacity(bindings.len());
                for binding in &bindings {
                    if let Some(row) = binding.row(alias)? {
                        rows.push(row.clone());
                    }
                }
                Ok(QueryOutput::Entities(rows))
            }
            Selection::Expr(ScalarExpr::Count { alias }) => {
                let mut count = 0u64;
                for binding in &bindings {
                    if binding.row(alias)?.is_some() {
                        count += 1;
                    }
                }
                Ok(QueryOutput::Count(count))
            }
            Selection::Expr(expr) => Ok(QueryOutput::Values(
                bindings
                    .iter()
                    .map(|binding| binding.scalar(expr))
                    .collect::<Result<Vec<_>, Error>>()?,
            )),
        }
    }

    /// Execute a count plan.
    pub fn count(&self, plan: &SelectPlan) -> Result<u64, Error> {
        match self.execute(plan)? {
            QueryOutput::Count(count) => Ok(count),
            _ => Err(Error::Execution("plan does not select a count".to_string())),
        }
    }

    /// Execute an entity plan.
    pub fn entities(&self, plan: &SelectPlan) -> Result<Vec<EntityRow>, Error> {
        match self.execute(plan)? {
            QueryOutput::Entities(rows) => Ok(rows),
            _ => Err(Error::Execution("plan does not select entities".to_string())),
        }
    }

    /// Execute a plan selecting a scalar expression.
    pub fn values(&self, plan: &SelectPlan) -> Result<Vec<Value>, Error> {
        match self.execute(plan)? {
            QueryOutput::Values(values) => Ok(values),
            _ => Err(Error::Execution("plan does not select values".to_string())),
        }
    }

    /// Expand the root rows through every join, in plan order.
    fn join_rows<'p>(&'p self, plan: &'p SelectPlan) -> Result<Vec<RowBinding<'p>>, Error> {
        self.catalog.entity(&plan.root_entity)?;
        let mut bindings: Vec<RowBinding<'p>> = self
            .store
            .rows(&plan.root_entity)
            .iter()
            .map(|row| RowBinding::root(&plan.root_alias, row))
            .collect();

        for join in &plan.joins {
            let parent_entity = Self::entity_of(plan, &join.parent_alias)?;
            let relation = self.catalog.relation(parent_entity, &join.relation)?;
            let targets = self.store.rows(&relation.to_entity);
            trace!(
                alias = %join.alias,
                relation = %relation.name,
                parents = bindings.len(),
                "joining"
            );

            let mut next = Vec::with_capacity(bindings.len());
            for binding in &bindings {
                let key = binding
                    .row(&join.parent_alias)?
                    .and_then(|row| row.get(&relation.from_field))
                    .filter(|value| !value.is_null());

                let mut matched = false;
                if let Some(key) = key {
                    for target in targets {
                        let related = target
                            .get(&relation.to_field)
                            .is_some_and(|value| PredicateEvaluator::values_equal(key, value));
                        if related {
                            next.push(binding.bind(&join.alias, Some(target)));
                            matched = true;
                        }
                    }
                }
                if !matched && join.join_type == JoinType::Left {
                    next.push(binding.bind(&join.alias, None));
                }
            }
            bindings = next;
        }

        Ok(bindings)
    }

    fn entity_of<'p>(plan: &'p SelectPlan, alias: &str) -> Result<&'p str, Error> {
        if plan.root_alias == alias {
            return Ok(&plan.root_entity);
        }
        plan.join(alias)
            .map(|join| join.entity.as_str())
            .ok_or_else(|| Error::Execution(format!("unknown alias {}", alias)))
    }
}
