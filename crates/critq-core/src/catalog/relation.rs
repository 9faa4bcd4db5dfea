//! Relation definitions between entities.

use serde::{Deserialize, Serialize};

/// Cardinality of a relation, seen from its source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// At most one target per source row; many sources share a target.
    ManyToOne,
    /// Any number of targets per source row.
    OneToMany,
}

impl Cardinality {
    /// Whether a source row can reach more than one target row.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Cardinality::OneToMany)
    }
}

/// A relation definition between two entities.
///
/// Rows are related when the source row's `from_field` equals the target
/// row's `to_field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relation name (unique per source entity).
    pub name: String,
    /// Source entity name.
    pub from_entity: String,
    /// Target entity name.
    pub to_entity: String,
    /// Relation cardinality.
    pub cardinality: Cardinality,
    /// Field on the source entity.
    pub from_field: String,
    /// Field on the target entity.
    pub to_field: String,
}

impl RelationDef {
    fn with_cardinality(
        cardinality: Cardinality,
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality,
            from_field: from_field.into(),
            to_field: to_field.into(),
        }
    }

    /// Create a many-to-one relation (foreign key on the source).
    pub fn many_to_one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self::with_cardinality(
            Cardinality::ManyToOne,
            name,
            from_entity,
            from_field,
            to_entity,
            to_field,
        )
    }

    /// Create a one-to-many relation (foreign key on the target).
    pub fn one_to_many(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self::with_cardinality(
            Cardinality::OneToMany,
            name,
            from_entity,
            from_field,
            to_entity,
            to_field,
        )
    }

    /// The same link navigated from the target side, under a new name.
    pub fn inverse(&self, name: impl Into<String>) -> Self {
        let cardinality = match self.cardinality {
            Cardinality::ManyToOne => Cardinality::OneToMany,
            Cardinality::OneToMany => Cardinality::ManyToOne,
        };
        Self {
            name: name.into(),
            from_entity: self.to_entity.clone(),
            to_entity: self.from_entity.clone(),
            cardinality,
            from_field: self.to_field.clone(),
            to_field: self.from_field.clone(),
        }
    }
}
