//! In-memory catalog of entities and relations.

use std::collections::HashMap;

use super::entity::EntityDef;
use super::relation::RelationDef;
use crate::error::Error;

/// Immutable set of entity and relation definitions.
///
/// Built once with the `with_*` methods and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: HashMap<String, EntityDef>,
    /// Keyed by (source entity, relation name).
    relations: HashMap<(String, String), RelationDef>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity definition, replacing one with the same name.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Add a relation definition.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.insert(
            (relation.from_entity.clone(), relation.name.clone()),
            relation,
        );
        self
    }

    /// Get an entity definition by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Get an entity definition, failing if it is not declared.
    pub fn entity(&self, name: &str) -> Result<&EntityDef, Error> {
        self.get_entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// Get a relation declared on an entity, failing if it is not declared.
    pub fn relation(&self, from_entity: &str, name: &str) -> Result<&RelationDef, Error> {
        self.relations
            .get(&(from_entity.to_string(), name.to_string()))
            .ok_or_else(|| Error::UnknownRelation {
                entity: from_entity.to_string(),
                relation: name.to_string(),
            })
    }

    /// Check that an entity declares a column.
    pub fn check_column(&self, entity: &str, column: &str) -> Result<(), Error> {
        let def = self.entity(entity)?;
        if def.get_field(column).is_none() {
            return Err(Error::UnknownColumn {
                entity: entity.to_string(),
                column: column.to_string(),
            });
        }
        Ok(())
    }
}
