//! Person/Business catalog and the join graph over it.

use critq_core::{Catalog, EntityDef, FieldDef, JoinNode, RelationDef, Relationship, ScalarType};

/// Catalog with the `Person` and `Business` entities.
///
/// A person may work for a business (`employer`) and may have a parent;
/// a business may have an owner.
pub fn catalog() -> Catalog {
    let employer = RelationDef::many_to_one("employer", "Person", "employerId", "Business", "id");
    let parent = RelationDef::many_to_one("parent", "Person", "parentId", "Person", "id");

    Catalog::new()
        .with_entity(EntityDef::new("Person", "id").with_fields([
            FieldDef::new("id", ScalarType::Int64),
            FieldDef::new("firstName", ScalarType::String),
            FieldDef::new("lastName", ScalarType::String),
            FieldDef::optional("birthdate", ScalarType::Date),
            FieldDef::optional("employerId", ScalarType::Int64),
            FieldDef::optional("parentId", ScalarType::Int64),
        ]))
        .with_entity(EntityDef::new("Business", "id").with_fields([
            FieldDef::new("id", ScalarType::Int64),
            FieldDef::new("name", ScalarType::String),
            FieldDef::optional("address", ScalarType::String),
            FieldDef::optional("ownerId", ScalarType::Int64),
        ]))
        .with_relation(employer.inverse("employees"))
        .with_relation(employer)
        .with_relation(parent.inverse("children"))
        .with_relation(parent)
        .with_relation(RelationDef::many_to_one(
            "owner", "Business", "ownerId", "Person", "id",
        ))
}

/// Join nodes used by the person query handler.
#[derive(Debug, Clone)]
pub struct PersonJoins {
    /// Root: the people being searched.
    pub person: JoinNode,
    /// The person's employer.
    pub business: JoinNode,
    /// Owner of the employer.
    pub owner: JoinNode,
    /// Each of the person's children.
    pub child: JoinNode,
}

impl PersonJoins {
    pub fn new() -> Self {
        let person = JoinNode::root("person", "Person");
        let business = person.join("business", "Business", Relationship::single("employer"));
        let owner = business.join("owner", "Person", Relationship::single("owner"));
        let child = person.join("child", "Person", Relationship::set("children"));
        Self {
            person,
            business,
            owner,
            child,
        }
    }
}

impl Default for PersonJoins {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use critq_core::Cardinality;

    use super::*;

    #[test]
    fn test_relations_are_navigable_both_ways() {
        let catalog = catalog();
        let employer = catalog.relation("Person", "employer").unwrap();
        let employees = catalog.relation("Business", "employees").unwrap();

        assert_eq!(employer.cardinality, Cardinality::ManyToOne);
        assert_eq!(employees.cardinality, Cardinality::OneToMany);
        assert_eq!(employer.from_field, employees.to_field);

        let children = catalog.relation("Person", "children").unwrap();
        assert_eq!(children.cardinality, Cardinality::OneToMany);
        assert_eq!((children.from_field.as_str(), children.to_field.as_str()), ("id", "parentId"));
    }

    #[test]
    fn test_only_child_path_is_to_many() {
        let joins = PersonJoins::new();
        assert!(!joins.business.has_one_to_many_on_path());
        assert!(!joins.owner.has_one_to_many_on_path());
        assert!(joins.child.has_one_to_many_on_path());
        assert_eq!(joins.owner.root_node(), &joins.person);
    }
}
