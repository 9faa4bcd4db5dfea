//! Join strength requirements.

use std::collections::HashMap;

use super::graph::JoinNode;

/// How a join must be materialized: inner or outer, fetch or plain.
///
/// Requirements merge with `inner = a.inner && b.inner` and
/// `fetch = a.fetch || b.fetch`, so a node used by both a restriction and a
/// sort becomes an outer fetch join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinKind {
    /// Rows without a related row are dropped.
    pub inner: bool,
    /// The related row is loaded with its parent.
    pub fetch: bool,
}

impl JoinKind {
    /// Requirement contributed by a restriction.
    pub const RESTRICTION: JoinKind = JoinKind {
        inner: true,
        fetch: false,
    };

    /// Requirement contributed by a sort.
    pub const SORT: JoinKind = JoinKind {
        inner: false,
        fetch: true,
    };

    /// Neutral element of [`JoinKind::merge`].
    pub const IDENTITY: JoinKind = JoinKind {
        inner: true,
        fetch: false,
    };

    /// Combine two requirements for the same node.
    pub fn merge(self, other: JoinKind) -> JoinKind {
        JoinKind {
            inner: self.inner && other.inner,
            fetch: self.fetch || other.fetch,
        }
    }
}

impl Default for JoinKind {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Resolve the join kind of every node on the root paths of the given nodes.
///
/// Each restriction node contributes [`JoinKind::RESTRICTION`] and each sort
/// node [`JoinKind::SORT`] to itself and all of its ancestors.
pub fn resolve_join_kinds<'a>(
    restriction_nodes: impl IntoIterator<Item = &'a JoinNode>,
    sort_nodes: impl IntoIterator<Item = &'a JoinNode>,
) -> HashMap<JoinNode, JoinKind> {
    let mut kinds: HashMap<JoinNode, JoinKind> = HashMap::new();
    let contributions = restriction_nodes
        .into_iter()
        .map(|node| (node, JoinKind::RESTRICTION))
        .chain(sort_nodes.into_iter().map(|node| (node, JoinKind::SORT)));

    for (node, requirement) in contributions {
        for step in node.path_from_root() {
            let kind = kinds.entry(step).or_default();
            *kind = kind.merge(requirement);
        }
    }
    kinds
}
