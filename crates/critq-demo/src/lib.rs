//! critq demo - person/business search over an in-memory data set.
//!
//! Wires a [`PersonQueryHandler`] to the reference plan backend and runs the
//! compiled plans with [`PlanExecutor`] against the sample [`fixture`].

pub mod fixture;
pub mod model;
pub mod query;

use std::sync::Arc;

use chrono::NaiveDate;
use critq_core::proto::{QueryDefinition, SelectPlan};
use critq_core::{Catalog, EntityRow, Error, MemoryStore, PlanExecutor, QueryHandler};
use tracing::debug;

pub use model::{catalog, PersonJoins};
pub use query::{person_config, person_handler, PersonCriteria, PersonQueryHandler, PersonSort};

/// Person definition as callers build it.
pub type PersonQuery = QueryDefinition<PersonCriteria, PersonSort>;

/// Compiles person queries and runs them against the sample data.
pub struct PersonDirectory {
    catalog: Arc<Catalog>,
    store: MemoryStore,
    handler: PersonQueryHandler,
    today: NaiveDate,
}

impl PersonDirectory {
    /// Directory anchored at the local current date.
    pub fn new() -> Result<Self, Error> {
        Self::at(chrono::Local::now().date_naive())
    }

    /// Directory whose birthdates and underage cutoff are relative to `today`.
    pub fn at(today: NaiveDate) -> Result<Self, Error> {
        let catalog = Arc::new(model::catalog());
        let handler = person_handler(Arc::clone(&catalog), today)?;
        Ok(Self {
            catalog,
            store: fixture::people(today),
            handler,
            today,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn handler(&self) -> &PersonQueryHandler {
        &self.handler
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Compile the count plan for a definition.
    pub fn count_plan(&self, definition: &PersonQuery) -> Result<SelectPlan, Error> {
        Ok(self.handler.compile_count_query(definition)?.into_plan())
    }

    /// Compile the entity plan for a definition.
    pub fn entity_plan(&self, definition: &PersonQuery) -> Result<SelectPlan, Error> {
        Ok(self.handler.compile_entity_query(definition)?.into_plan())
    }

    /// Number of people matching the criteria.
    pub fn count(&self, definition: &PersonQuery) -> Result<u64, Error> {
        let plan = self.count_plan(definition)?;
        debug!(plan = %plan, "counting people");
        PlanExecutor::new(&self.catalog, &self.store).count(&plan)
    }

    /// People matching the criteria, in the requested order.
    pub fn search(&self, definition: &PersonQuery) -> Result<Vec<EntityRow>, Error> {
        let plan = self.entity_plan(definition)?;
        debug!(plan = %plan, "searching people");
        PlanExecutor::new(&self.catalog, &self.store).entities(&plan)
    }

    /// Identifiers of the people matching the criteria, in order.
    pub fn search_ids(&self, definition: &PersonQuery) -> Result<Vec<i64>, Error> {
        Ok(self
            .search(definition)?
            .iter()
            .filter_map(|row| row.get("id").and_then(|id| id.as_i64()))
            .collect())
    }
}
