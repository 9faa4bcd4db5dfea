//! Join nodes and relationship descriptors.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shape of a relationship as seen from its parent entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// To-one attribute.
    Single,
    /// Unordered to-many attribute.
    Collection,
    /// Ordered to-many attribute.
    List,
    /// To-many attribute without duplicates.
    Set,
}

/// Navigation from a parent entity to a related entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relationship {
    attribute: String,
    kind: RelationKind,
}

impl Relationship {
    /// Create a relationship over the named attribute.
    pub fn new(attribute: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
        }
    }

    /// A to-one relationship.
    pub fn single(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RelationKind::Single)
    }

    /// An unordered to-many relationship.
    pub fn collection(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RelationKind::Collection)
    }

    /// An ordered to-many relationship.
    pub fn list(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RelationKind::List)
    }

    /// A to-many relationship without duplicates.
    pub fn set(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RelationKind::Set)
    }

    /// Attribute (relation name) on the parent entity.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Shape of the relationship.
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Whether one parent row can reach more than one child row.
    pub fn is_one_to_many(&self) -> bool {
        self.kind != RelationKind::Single
    }
}

struct NodeInner {
    id: String,
    entity: String,
    parent: Option<JoinNode>,
    relationship: Option<Relationship>,
}

/// A point in the join tree rooted at the query's base entity.
///
/// Nodes are cheap to clone and compare by identifier. Identifiers must be
/// unique within one tree.
#[derive(Clone)]
pub struct JoinNode(Arc<NodeInner>);

impl JoinNode {
    /// Create the root node for a base entity.
    pub fn root(id: impl Into<String>, entity: impl Into<String>) -> Self {
        Self(Arc::new(NodeInner {
            id: id.into(),
            entity: entity.into(),
            parent: None,
            relationship: None,
        }))
    }

    /// Create a child node reached from this node over `relationship`.
    pub fn join(
        &self,
        id: impl Into<String>,
        entity: impl Into<String>,
        relationship: Relationship,
    ) -> Self {
        Self(Arc::new(NodeInner {
            id: id.into(),
            entity: entity.into(),
            parent: Some(self.clone()),
            relationship: Some(relationship),
        }))
    }

    /// Node identifier.
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Entity scanned at this node.
    pub fn entity(&self) -> &str {
        &self.0.entity
    }

    /// Parent node, `None` for a root.
    pub fn parent(&self) -> Option<&JoinNode> {
        self.0.parent.as_ref()
    }

    /// Relationship from the parent, `None` for a root.
    pub fn relationship(&self) -> Option<&Relationship> {
        self.0.relationship.as_ref()
    }

    /// Whether this node has no parent.
    pub fn is_root(&self) -> bool {
        self.0.parent.is_none()
    }

    /// The root of this node's tree.
    pub fn root_node(&self) -> &JoinNode {
        match &self.0.parent {
            Some(parent) => parent.root_node(),
            None => self,
        }
    }

    /// Whether both handles are the same node rather than two nodes sharing an id.
    pub fn same_node(&self, other: &JoinNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Nodes from the root down to this node, inclusive.
    pub fn path_from_root(&self) -> Vec<JoinNode> {
        let mut path = match &self.0.parent {
            Some(parent) => parent.path_from_root(),
            None => Vec::new(),
        };
        path.push(self.clone());
        path
    }

    /// Whether any relationship between the root and this node is to-many.
    pub fn has_one_to_many_on_path(&self) -> bool {
        let mut node = self;
        while let (Some(parent), Some(relationship)) = (node.parent(), node.relationship()) {
            if relationship.is_one_to_many() {
                return true;
            }
            node = parent;
        }
        false
    }
}

impl PartialEq for JoinNode {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for JoinNode {}

impl Hash for JoinNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for JoinNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JoinNode").field(&self.0.id).finish()
    }
}

impl fmt::Display for JoinNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (JoinNode, JoinNode, JoinNode, JoinNode) {
        let person = JoinNode::root("person", "Person");
        let business = person.join("business", "Business", Relationship::single("employer"));
        let owner = business.join("owner", "Person", Relationship::single("owner"));
        let child = person.join("child", "Person", Relationship::collection("children"));
        (person, business, owner, child)
    }

    #[test]
    fn test_path_from_root() {
        let (person, business, owner, _) = tree();

        assert_eq!(person.path_from_root(), vec![person.clone()]);
        assert_eq!(
            owner.path_from_root(),
            vec![person.clone(), business.clone(), owner.clone()]
        );
        assert_eq!(owner.root_node(), &person);
    }

    #[test]
    fn test_one_to_many_on_path() {
        let (person, business, owner, child) = tree();
        let grandchild = child.join("grandchild", "Person", Relationship::set("children"));
        let childs_employer = child.join("childEmployer", "Business", Relationship::single("employer"));

        assert!(!person.has_one_to_many_on_path());
        assert!(!business.has_one_to_many_on_path());
        assert!(!owner.has_one_to_many_on_path());
        assert!(child.has_one_to_many_on_path());
        assert!(grandchild.has_one_to_many_on_path());
        assert!(childs_employer.has_one_to_many_on_path());
    }

    #[test]
    fn test_equality_by_identifier() {
        let a = JoinNode::root("person", "Person");
        let b = JoinNode::root("person", "Person");
        let c = a.join("business", "Business", Relationship::single("employer"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.same_node(&b));
        assert!(c.parent().is_some_and(|p| p.same_node(&a)));
        assert_eq!(format!("{:?}", c), "JoinNode(\"business\")");
    }

    #[test]
    fn test_relationship_cardinality() {
        assert!(!Relationship::single("employer").is_one_to_many());
        assert!(Relationship::collection("children").is_one_to_many());
        assert!(Relationship::list("children").is_one_to_many());
        assert!(Relationship::set("children").is_one_to_many());
    }
}
