//! Query assembly engine.
//!
//! [`CriteriaQueryHandler`] compiles a [`QueryDefinition`] into a count
//! query or an entity query:
//!
//! 1. evaluate every restriction against the criteria, keeping present ones;
//! 2. group them by join node and split the nodes into those reachable
//!    without a to-many relationship and those behind one;
//! 3. resolve join kinds for the first group plus the sort joins and
//!    materialize them on the main query;
//! 4. build the main predicates;
//! 5. move the to-many restrictions into a subquery over a fresh root scan
//!    selecting root identifiers, and require `root.id IN (subquery)`;
//! 6. AND the predicates into the filter and apply the order clauses.
//!
//! Compilation is a pure function of the configuration and the definition.

use std::fmt;

use critq_proto::{QueryDefinition, SortDirection, SortInfo};
use tracing::{debug, warn};

use crate::backend::{QueryBackend, ResultKind};
use crate::config::{HandlerConfig, UnknownSortPolicy};
use crate::error::Error;
use crate::join::{resolve_join_kinds, JoinMaterializer, JoinNode};
use crate::restriction::AppliedRestriction;
use crate::sort::SortDefinition;

/// Compiles query definitions into backend queries.
pub trait QueryHandler<C, S> {
    /// Query returning a row count.
    type CountQuery;
    /// Query returning root entities.
    type EntityQuery;

    /// Compile a count query. Sorts are ignored.
    fn compile_count_query(
        &self,
        definition: &QueryDefinition<C, S>,
    ) -> Result<Self::CountQuery, Error>;

    /// Compile an entity query with its order clauses.
    fn compile_entity_query(
        &self,
        definition: &QueryDefinition<C, S>,
    ) -> Result<Self::EntityQuery, Error>;
}

/// Present restrictions on one join node.
type Group<'a, B> = (JoinNode, Vec<Box<dyn AppliedRestriction<B> + 'a>>);

/// [`QueryHandler`] driven by a [`HandlerConfig`].
pub struct CriteriaQueryHandler<C, S, B: QueryBackend> {
    backend: B,
    config: HandlerConfig<C, S, B>,
}

impl<C, S, B> CriteriaQueryHandler<C, S, B>
where
    S: PartialEq + fmt::Debug,
    B: QueryBackend,
{
    /// Create a handler, validating the configuration.
    ///
    /// Every restriction and sort must hang off the configured root, no two
    /// distinct join nodes may share an id, and sort identifiers must be
    /// unique.
    pub fn new(backend: B, config: HandlerConfig<C, S, B>) -> Result<Self, Error> {
        let root = config.root();
        if !root.is_root() {
            return Err(Error::Configuration(format!(
                "handler root {} has a parent",
                root.id()
            )));
        }

        let restriction_joins = config.restrictions().iter().map(|r| r.join());
        let sort_joins = config.sorts().iter().map(|s| s.join());
        for node in restriction_joins.chain(sort_joins) {
            if node.root_node() != root {
                return Err(Error::Configuration(format!(
                    "join node {} is rooted at {}, not {}",
                    node.id(),
                    node.root_node().id(),
                    root.id()
                )));
            }
        }

        let mut seen = vec![root.clone()];
        let restriction_joins = config.restrictions().iter().map(|r| r.join());
        let sort_joins = config.sorts().iter().map(|s| s.join());
        for node in restriction_joins.chain(sort_joins).flat_map(JoinNode::path_from_root) {
            match seen.iter().find(|s| s.id() == node.id()) {
                Some(other) if !other.same_node(&node) => {
                    return Err(Error::Configuration(format!(
                        "duplicate join node id {} ({} and {})",
                        node.id(),
                        other.entity(),
                        node.entity()
                    )));
                }
                Some(_) => {}
                None => seen.push(node),
            }
        }

        let sorts = config.sorts();
        for (i, sort) in sorts.iter().enumerate() {
            if sorts[..i].iter().any(|s| s.identifier() == sort.identifier()) {
                return Err(Error::Configuration(format!(
                    "duplicate sort identifier {:?}",
                    sort.identifier()
                )));
            }
        }

        Ok(Self { backend, config })
    }

    /// The backend queries are built with.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The handler configuration.
    pub fn config(&self) -> &HandlerConfig<C, S, B> {
        &self.config
    }

    fn compile(
        &self,
        kind: ResultKind,
        definition: &QueryDefinition<C, S>,
    ) -> Result<B::Query, Error> {
        let backend = &self.backend;
        let root = self.config.root();

        let (mut query, root_scan) = backend.create_query(kind, root.entity())?;
        if kind == ResultKind::Count {
            let count = backend.count(&root_scan);
            backend.select(&mut query, count);
        }

        let groups = self.group_restrictions(&definition.criteria);
        let (promoted, main): (Vec<Group<'_, B>>, Vec<Group<'_, B>>) = groups
            .into_iter()
            .partition(|(node, _)| node.has_one_to_many_on_path());

        let sorts = match kind {
            ResultKind::Entity => self.resolve_sorts(&definition.sorts)?,
            ResultKind::Count => Vec::new(),
        };

        debug!(
            kind = ?kind,
            main = ?main.iter().map(|(n, _)| n.id()).collect::<Vec<_>>(),
            promoted = ?promoted.iter().map(|(n, _)| n.id()).collect::<Vec<_>>(),
            sorts = sorts.len(),
            "compiling criteria query"
        );

        let kinds = resolve_join_kinds(
            main.iter().map(|(node, _)| node),
            sorts.iter().map(|(sort, _)| sort.join()),
        );
        let mut materializer = JoinMaterializer::new(backend, root, root_scan.clone());
        materializer.materialize_all(&mut query, main.iter().map(|(node, _)| node), &kinds)?;
        materializer.materialize_all(
            &mut query,
            sorts.iter().map(|(sort, _)| sort.join()),
            &kinds,
        )?;

        let mut predicates = self.build_predicates(&query, &materializer, &main)?;
        if !promoted.is_empty() {
            predicates.push(self.promote(&query, &root_scan, &promoted)?);
        }
        if !predicates.is_empty() {
            let filter = backend.and(predicates);
            backend.filter(&mut query, filter);
        }

        if !sorts.is_empty() {
            let orders = sorts
                .iter()
                .map(|(sort, direction)| {
                    let scan = materializer.scan(sort.join())?;
                    sort.to_order(backend, scan, *direction)
                })
                .collect::<Result<Vec<_>, Error>>()?;
            backend.order_by(&mut query, orders);
        }

        Ok(query)
    }

    fn group_restrictions<'a>(&'a self, criteria: &C) -> Vec<Group<'a, B>> {
        let mut groups: Vec<Group<'a, B>> = Vec::new();
        for restriction in self.config.restrictions() {
            let Some(applied) = restriction.evaluate(criteria) else {
                continue;
            };
            let node = applied.join().clone();
            match groups.iter().position(|(n, _)| *n == node) {
                Some(i) => groups[i].1.push(applied),
                None => groups.push((node, vec![applied])),
            }
        }
        groups
    }

    fn resolve_sorts<'a>(
        &'a self,
        sorts: &[SortInfo<S>],
    ) -> Result<Vec<(&'a SortDefinition<S>, SortDirection)>, Error> {
        let mut resolved = Vec::with_capacity(sorts.len());
        for info in sorts {
            let configured = self
                .config
                .sorts()
                .iter()
                .find(|s| s.identifier() == &info.identifier);

            match configured {
                Some(sort) => {
                    if sort.join().has_one_to_many_on_path() {
                        warn!(
                            sort = ?info.identifier,
                            join = sort.join().id(),
                            "sort path crosses a one-to-many relationship"
                        );
                    }
                    resolved.push((sort, info.direction));
                }
                None => match self.config.options().unknown_sort {
                    UnknownSortPolicy::Ignore => {
                        debug!(sort = ?info.identifier, "skipping unconfigured sort");
                    }
                    UnknownSortPolicy::Reject => {
                        return Err(Error::UnknownSort(format!("{:?}", info.identifier)));
                    }
                },
            }
        }
        Ok(resolved)
    }

    fn build_predicates(
        &self,
        query: &B::Query,
        materializer: &JoinMaterializer<'_, B>,
        groups: &[Group<'_, B>],
    ) -> Result<Vec<B::Predicate>, Error> {
        let mut predicates = Vec::new();
        for (node, restrictions) in groups {
            let scan = materializer.scan(node)?;
            for restriction in restrictions {
                predicates.push(restriction.to_predicate(&self.backend, query, scan)?);
            }
        }
        Ok(predicates)
    }

    /// Filter the to-many groups inside `root.id IN (SELECT id ...)`.
    fn promote(
        &self,
        outer: &B::Query,
        outer_root: &B::Scan,
        groups: &[Group<'_, B>],
    ) -> Result<B::Predicate, Error> {
        let backend = &self.backend;
        let root = self.config.root();

        let (mut subquery, sub_root) = backend.create_subquery(outer, root.entity())?;
        let kinds = resolve_join_kinds(
            groups.iter().map(|(node, _)| node),
            std::iter::empty::<&JoinNode>(),
        );
        let mut materializer = JoinMaterializer::new(backend, root, sub_root.clone());
        materializer.materialize_all(&mut subquery, groups.iter().map(|(node, _)| node), &kinds)?;

        let predicates = self.build_predicates(&subquery, &materializer, groups)?;
        let sub_id = backend.column(&sub_root, self.config.id_column())?;
        backend.select(&mut subquery, sub_id);
        let filter = backend.and(predicates);
        backend.filter(&mut subquery, filter);

        let outer_id = backend.column(outer_root, self.config.id_column())?;
        Ok(backend.in_subquery(&outer_id, subquery))
    }
}

impl<C, S, B> QueryHandler<C, S> for CriteriaQueryHandler<C, S, B>
where
    S: PartialEq + fmt::Debug,
    B: QueryBackend,
{
    type CountQuery = B::Query;
    type EntityQuery = B::Query;

    fn compile_count_query(&self, definition: &QueryDefinition<C, S>) -> Result<B::Query, Error> {
        self.compile(ResultKind::Count, definition)
    }

    fn compile_entity_query(&self, definition: &QueryDefinition<C, S>) -> Result<B::Query, Error> {
        self.compile(ResultKind::Entity, definition)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use critq_proto::{
        CriteriaField, JoinType, PredicateExpr, ScalarExpr, SelectPlan, Selection,
    };

    use super::*;
    use crate::backend::{PlanBackend, QueryContext};
    use crate::config::CompileOptions;
    use crate::handlers;
    use crate::restriction::{predicate_builder, RestrictionDefinition, RestrictionMapping};
    use crate::test_support::{people_catalog, people_joins, PeopleJoins};

    #[derive(Debug, Default)]
    struct Criteria {
        last_name: Option<CriteriaField<String>>,
        company_name: Option<String>,
        child_name: Option<String>,
        employed: Option<bool>,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Sort {
        FirstName,
        BusinessName,
        OwnerName,
        Unmapped,
    }

    type Handler = CriteriaQueryHandler<Criteria, Sort, PlanBackend>;

    fn config() -> HandlerConfig<Criteria, Sort, PlanBackend> {
        config_for(&people_joins())
    }

    fn config_for(joins: &PeopleJoins) -> HandlerConfig<Criteria, Sort, PlanBackend> {
        HandlerConfig::new(&joins.person, "id")
            .restrict(RestrictionMapping::criteria_field(
                |c: &Criteria| c.last_name.clone(),
                RestrictionDefinition::new(&joins.person, "lastName", handlers::string_field()),
            ))
            .restrict(RestrictionMapping::new(
                |c: &Criteria| c.company_name.clone(),
                RestrictionDefinition::new(&joins.business, "name", handlers::like()),
            ))
            .restrict(RestrictionMapping::new(
                |c: &Criteria| c.child_name.clone(),
                RestrictionDefinition::new(&joins.child, "firstName", handlers::like()),
            ))
            .restrict(RestrictionMapping::new(
                |c: &Criteria| c.employed,
                RestrictionDefinition::new(&joins.person, "employerId", handlers::not_null()),
            ))
            .sort(SortDefinition::new(Sort::FirstName, &joins.person, "firstName"))
            .sort(SortDefinition::new(Sort::BusinessName, &joins.business, "name"))
            .sort(SortDefinition::new(Sort::OwnerName, &joins.owner, "lastName"))
    }

    fn handler() -> Handler {
        let backend = PlanBackend::new(Arc::new(people_catalog()));
        CriteriaQueryHandler::new(backend, config()).unwrap()
    }

    fn entity_plan(handler: &Handler, definition: &QueryDefinition<Criteria, Sort>) -> SelectPlan {
        handler.compile_entity_query(definition).unwrap().into_plan()
    }

    #[test]
    fn test_no_criteria_no_filter() {
        let handler = handler();
        let plan = entity_plan(&handler, &QueryDefinition::new(Criteria::default()));

        assert!(plan.filter.is_none());
        assert!(plan.joins.is_empty());
        assert!(plan.order_by.is_empty());
        assert_eq!(plan.selection, Selection::Entity { alias: "t0".into() });
    }

    #[test]
    fn test_count_selects_count_and_ignores_sorts() {
        let handler = handler();
        let definition = QueryDefinition::new(Criteria::default()).with_sort(Sort::BusinessName);
        let plan = handler.compile_count_query(&definition).unwrap().into_plan();

        assert!(plan.is_count());
        assert!(plan.joins.is_empty());
        assert!(plan.order_by.is_empty());
    }

    #[test]
    fn test_restrictions_on_one_node_are_anded() {
        let handler = handler();
        let criteria = Criteria {
            last_name: Some(CriteriaField::eq("Smith".to_string())),
            employed: Some(true),
            ..Default::default()
        };
        let plan = entity_plan(&handler, &QueryDefinition::new(criteria));

        assert_eq!(
            plan.filter.map(|f| f.to_string()).as_deref(),
            Some("t0.lastName = 'Smith' AND t0.employerId IS NOT NULL")
        );
    }

    #[test]
    fn test_join_kinds() {
        let handler = handler();

        let criteria = Criteria {
            company_name: Some("Acme".into()),
            ..Default::default()
        };
        let plan = entity_plan(&handler, &QueryDefinition::new(criteria));
        assert_eq!(plan.joins[0].join_type, JoinType::Inner);
        assert!(!plan.joins[0].fetch);

        let plan = entity_plan(
            &handler,
            &QueryDefinition::new(Criteria::default()).with_sort(Sort::BusinessName),
        );
        assert_eq!(plan.joins[0].join_type, JoinType::Left);
        assert!(plan.joins[0].fetch);

        let criteria = Criteria {
            company_name: Some("Acme".into()),
            ..Default::default()
        };
        let plan = entity_plan(
            &handler,
            &QueryDefinition::new(criteria).with_sort(Sort::OwnerName),
        );
        assert_eq!(plan.joins.len(), 2);
        assert_eq!(plan.joins[0].relation, "employer");
        assert_eq!(plan.joins[0].join_type, JoinType::Left);
        assert!(plan.joins[0].fetch);
        assert_eq!(plan.joins[1].relation, "owner");
        assert_eq!(plan.joins[1].join_type, JoinType::Left);
    }

    #[test]
    fn test_one_to_many_restriction_is_promoted() {
        let handler = handler();
        let criteria = Criteria {
            child_name: Some("Bill".into()),
            last_name: Some(CriteriaField::eq("Johnson".to_string())),
            ..Default::default()
        };
        let plan = entity_plan(&handler, &QueryDefinition::new(criteria));

        assert!(plan.joins.is_empty());
        assert_eq!(
            plan.to_string(),
            "SELECT t0 FROM Person t0 WHERE t0.lastName = 'Johnson' AND t0.id IN \
             (SELECT tq0_0.id FROM Person tq0_0 JOIN tq0_0.children tq0_1 \
             WHERE tq0_1.firstName LIKE 'Bill')"
        );
    }

    #[test]
    fn test_unknown_sort_policy() {
        let handler = handler();
        let definition = QueryDefinition::new(Criteria::default())
            .with_sort(Sort::Unmapped)
            .with_sort(Sort::FirstName);
        let plan = entity_plan(&handler, &definition);
        assert_eq!(plan.order_by.len(), 1);
        assert_eq!(plan.order_by[0].expr, ScalarExpr::column("t0", "firstName"));

        let backend = PlanBackend::new(Arc::new(people_catalog()));
        let strict = CriteriaQueryHandler::new(
            backend,
            config().with_options(
                CompileOptions::new().with_unknown_sort(UnknownSortPolicy::Reject),
            ),
        )
        .unwrap();
        assert!(matches!(
            strict.compile_entity_query(&definition),
            Err(Error::UnknownSort(_))
        ));
        assert!(strict.compile_count_query(&definition).is_ok());
    }

    #[test]
    fn test_compilation_is_repeatable() {
        let handler = handler();
        let definition = QueryDefinition::new(Criteria {
            company_name: Some("A%".into()),
            child_name: Some("M%".into()),
            ..Default::default()
        })
        .with_sort(Sort::OwnerName)
        .with_sort(Sort::FirstName);

        assert_eq!(entity_plan(&handler, &definition), entity_plan(&handler, &definition));
    }

    #[test]
    fn test_custom_builder_sees_query() {
        let joins = people_joins();
        let builder = predicate_builder(|ctx: &QueryContext<'_, PlanBackend>, _: &bool| {
            let backend = ctx.backend();
            let (mut sub, sub_root) = backend.create_subquery(ctx.query(), "Person")?;
            let parent = backend.column(&sub_root, "parentId")?;
            backend.select(&mut sub, parent.clone());
            backend.filter(&mut sub, backend.is_not_null(&parent));
            Ok(backend.in_subquery(ctx.path(), sub))
        });
        let config = HandlerConfig::<Criteria, Sort, PlanBackend>::new(&joins.person, "id")
            .restrict(RestrictionMapping::new(
                |c: &Criteria| c.employed,
                RestrictionDefinition::new(&joins.person, "id", builder),
            ));
        let backend = PlanBackend::new(Arc::new(people_catalog()));
        let handler = CriteriaQueryHandler::new(backend, config).unwrap();

        let plan = entity_plan(
            &handler,
            &QueryDefinition::new(Criteria {
                employed: Some(true),
                ..Default::default()
            }),
        );
        assert!(matches!(plan.filter, Some(PredicateExpr::InSubquery { .. })));
    }

    #[test]
    fn test_config_validation() {
        let joins = people_joins();
        let backend = PlanBackend::new(Arc::new(people_catalog()));

        let duplicate = config_for(&joins).sort(SortDefinition::new(Sort::FirstName, &joins.person, "lastName"));
        assert!(matches!(
            CriteriaQueryHandler::new(backend.clone(), duplicate),
            Err(Error::Configuration(_))
        ));

        let elsewhere = JoinNode::root("business_root", "Business");
        let foreign = config_for(&joins).sort(SortDefinition::new(Sort::Unmapped, &elsewhere, "name"));
        assert!(matches!(
            CriteriaQueryHandler::new(backend.clone(), foreign),
            Err(Error::Configuration(_))
        ));

        let second_business =
            joins
                .person
                .join("business", "Business", crate::join::Relationship::single("employer"));
        let shadowed = config_for(&joins).sort(SortDefinition::new(Sort::Unmapped, &second_business, "name"));
        assert!(matches!(
            CriteriaQueryHandler::new(backend.clone(), shadowed),
            Err(Error::Configuration(ref msg)) if msg.contains("duplicate join node id business")
        ));

        let nested = joins
            .owner
            .join("person", "Person", crate::join::Relationship::single("owner"));
        let reused_root_id = config_for(&joins).sort(SortDefinition::new(Sort::Unmapped, &nested, "firstName"));
        assert!(CriteriaQueryHandler::new(backend.clone(), reused_root_id).is_err());

        let rooted_at_child =
            HandlerConfig::<Criteria, Sort, PlanBackend>::new(&joins.business, "id");
        assert!(CriteriaQueryHandler::new(backend, rooted_at_child).is_err());
    }
}
