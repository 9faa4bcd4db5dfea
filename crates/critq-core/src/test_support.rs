//! Shared fixtures for unit tests.

use crate::catalog::{Catalog, EntityDef, FieldDef, RelationDef, ScalarType};
use crate::join::{JoinNode, Relationship};

/// Person/Business catalog with employer, parent, children and owner relations.
pub(crate) fn people_catalog() -> Catalog {
    let parent = RelationDef::many_to_one("parent", "Person", "parentId", "Person", "id");

    Catalog::new()
        .with_entity(
            EntityDef::new("Person", "id").with_fields([
                FieldDef::new("id", ScalarType::Int64),
                FieldDef::new("firstName", ScalarType::String),
                FieldDef::new("lastName", ScalarType::String),
                FieldDef::optional("birthdate", ScalarType::Date),
                FieldDef::optional("employerId", ScalarType::Int64),
                FieldDef::optional("parentId", ScalarType::Int64),
            ]),
        )
        .with_entity(
            EntityDef::new("Business", "id").with_fields([
                FieldDef::new("id", ScalarType::Int64),
                FieldDef::new("name", ScalarType::String),
                FieldDef::optional("address", ScalarType::String),
                FieldDef::optional("ownerId", ScalarType::Int64),
            ]),
        )
        .with_relation(RelationDef::many_to_one(
            "employer",
            "Person",
            "employerId",
            "Business",
            "id",
        ))
        .with_relation(parent.inverse("children"))
        .with_relation(parent)
        .with_relation(RelationDef::many_to_one(
            "owner", "Business", "ownerId", "Person", "id",
        ))
}

/// Join nodes over [`people_catalog`].
pub(crate) struct PeopleJoins {
    pub person: JoinNode,
    pub business: JoinNode,
    pub owner: JoinNode,
    pub child: JoinNode,
}

pub(crate) fn people_joins() -> PeopleJoins {
    let person = JoinNode::root("person", "Person");
    let business = person.join("business", "Business", Relationship::single("employer"));
    let owner = business.join("owner", "Person", Relationship::single("owner"));
    let child = person.join("child", "Person", Relationship::collection("children"));
    PeopleJoins {
        person,
        business,
        owner,
        child,
    }
}
