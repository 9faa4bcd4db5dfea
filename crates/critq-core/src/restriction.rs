//! Restriction model: criteria fields bound to join paths and predicate builders.

use std::sync::Arc;

use critq_proto::CriteriaField;

use crate::backend::{QueryBackend, QueryContext};
use crate::error::Error;
use crate::join::JoinNode;

/// Builds a predicate from a resolved column path and a criteria value.
pub type PredicateBuilder<B, V> = Arc<
    dyn Fn(&QueryContext<'_, B>, &V) -> Result<<B as QueryBackend>::Predicate, Error> + Send + Sync,
>;

/// Wrap a closure as a [`PredicateBuilder`].
pub fn predicate_builder<B, V, F>(f: F) -> PredicateBuilder<B, V>
where
    B: QueryBackend,
    F: Fn(&QueryContext<'_, B>, &V) -> Result<B::Predicate, Error> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Where a restriction applies and how its predicate is built.
pub struct RestrictionDefinition<B: QueryBackend, V> {
    join: JoinNode,
    column: String,
    builder: PredicateBuilder<B, V>,
}

impl<B: QueryBackend, V> Clone for RestrictionDefinition<B, V> {
    fn clone(&self) -> Self {
        Self {
            join: self.join.clone(),
            column: self.column.clone(),
            builder: Arc::clone(&self.builder),
        }
    }
}

impl<B: QueryBackend, V> RestrictionDefinition<B, V> {
    /// Restrict `column` of the entity at `join` using `builder`.
    pub fn new(join: &JoinNode, column: impl Into<String>, builder: PredicateBuilder<B, V>) -> Self {
        Self {
            join: join.clone(),
            column: column.into(),
            builder,
        }
    }

    /// Join node holding the restricted column.
    pub fn join(&self) -> &JoinNode {
        &self.join
    }

    /// Restricted column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Build the predicate for `value` against the materialized `scan`.
    pub fn to_predicate(
        &self,
        backend: &B,
        query: &B::Query,
        scan: &B::Scan,
        value: &V,
    ) -> Result<B::Predicate, Error> {
        let path = backend.column(scan, &self.column)?;
        let context = QueryContext::new(backend, query, path);
        (self.builder)(&context, value)
    }
}

/// A restriction definition paired with the value read from one criteria record.
pub struct RestrictionValue<'a, B: QueryBackend, V> {
    definition: &'a RestrictionDefinition<B, V>,
    value: Option<V>,
}

impl<'a, B: QueryBackend, V> RestrictionValue<'a, B, V> {
    /// The definition the value belongs to.
    pub fn definition(&self) -> &'a RestrictionDefinition<B, V> {
        self.definition
    }

    /// The value, if present.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Whether a value is present.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Consume the restriction value, returning the value if present.
    pub fn into_value(self) -> Option<V> {
        self.value
    }
}

type Presence<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;
type Getter<C, V> = Box<dyn Fn(&C) -> Option<V> + Send + Sync>;

/// Binds a field of criteria record `C` to a restriction definition.
pub struct RestrictionMapping<C, B: QueryBackend, V> {
    has_value: Presence<C>,
    getter: Getter<C, V>,
    definition: RestrictionDefinition<B, V>,
}

impl<C, B, V> RestrictionMapping<C, B, V>
where
    B: QueryBackend,
    C: 'static,
    V: 'static,
{
    /// Map the value returned by `getter`; the field is present when it is `Some`.
    pub fn new<G>(getter: G, definition: RestrictionDefinition<B, V>) -> Self
    where
        G: Fn(&C) -> Option<V> + Send + Sync + 'static,
    {
        let getter: Getter<C, V> = Box::new(getter);
        Self {
            has_value: Box::new(|_| true),
            getter,
            definition,
        }
    }

    /// Replace the presence test. The getter is only consulted when it passes.
    pub fn with_presence<P>(mut self, has_value: P) -> Self
    where
        P: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.has_value = Box::new(has_value);
        self
    }

    /// The mapped definition.
    pub fn definition(&self) -> &RestrictionDefinition<B, V> {
        &self.definition
    }

    /// Read this restriction's value from a criteria record.
    pub fn to_restriction_value(&self, criteria: &C) -> RestrictionValue<'_, B, V> {
        let value = if (self.has_value)(criteria) {
            (self.getter)(criteria)
        } else {
            None
        };
        RestrictionValue {
            definition: &self.definition,
            value,
        }
    }
}

impl<C, B, W> RestrictionMapping<C, B, CriteriaField<W>>
where
    B: QueryBackend,
    C: 'static,
    W: 'static,
{
    /// Map an operator/value field; a field without a value is absent.
    pub fn criteria_field<G>(getter: G, definition: RestrictionDefinition<B, CriteriaField<W>>) -> Self
    where
        G: Fn(&C) -> Option<CriteriaField<W>> + Send + Sync + 'static,
    {
        Self::new(
            move |criteria| getter(criteria).filter(CriteriaField::has_value),
            definition,
        )
    }
}

/// Type-erased restriction mapping, so mappings over different value types
/// can live in one handler configuration.
pub trait Restriction<C, B: QueryBackend>: Send + Sync {
    /// Join node the restriction applies to.
    fn join(&self) -> &JoinNode;

    /// Evaluate against a criteria record; `None` when the field is absent.
    fn evaluate<'a>(&'a self, criteria: &C) -> Option<Box<dyn AppliedRestriction<B> + 'a>>;
}

/// A restriction with a value present, ready to become a predicate.
pub trait AppliedRestriction<B: QueryBackend> {
    /// Join node the restriction applies to.
    fn join(&self) -> &JoinNode;

    /// Build the predicate against the materialized scan of [`Self::join`].
    fn to_predicate(&self, backend: &B, query: &B::Query, scan: &B::Scan)
        -> Result<B::Predicate, Error>;
}

struct BoundRestriction<'a, B: QueryBackend, V> {
    definition: &'a RestrictionDefinition<B, V>,
    value: V,
}

impl<B: QueryBackend, V> AppliedRestriction<B> for BoundRestriction<'_, B, V> {
    fn join(&self) -> &JoinNode {
        &self.definition.join
    }

    fn to_predicate(
        &self,
        backend: &B,
        query: &B::Query,
        scan: &B::Scan,
    ) -> Result<B::Predicate, Error> {
        self.definition.to_predicate(backend, query, scan, &self.value)
    }
}

impl<C, B, V> Restriction<C, B> for RestrictionMapping<C, B, V>
where
    B: QueryBackend + 'static,
    C: 'static,
    V: 'static,
{
    fn join(&self) -> &JoinNode {
        &self.definition.join
    }

    fn evaluate<'a>(&'a self, criteria: &C) -> Option<Box<dyn AppliedRestriction<B> + 'a>> {
        let value = self.to_restriction_value(criteria).into_value()?;
        Some(Box::new(BoundRestriction {
            definition: &self.definition,
            value,
        }))
    }
}
