//! Turning join nodes into backend scans.

use std::collections::HashMap;

use tracing::trace;

use super::graph::JoinNode;
use super::kind::JoinKind;
use crate::backend::QueryBackend;
use crate::error::Error;

/// Materializes join nodes against one backend query.
///
/// Seeded with the root node bound to the query's root scan. Each node is
/// joined at most once; later references reuse its scan. A materializer
/// belongs to a single query and must not be reused for another one.
pub struct JoinMaterializer<'a, B: QueryBackend> {
    backend: &'a B,
    root: JoinNode,
    scans: HashMap<JoinNode, B::Scan>,
}

impl<'a, B: QueryBackend> JoinMaterializer<'a, B> {
    /// Create a materializer with `root` bound to `root_scan`.
    pub fn new(backend: &'a B, root: &JoinNode, root_scan: B::Scan) -> Self {
        let mut scans = HashMap::new();
        scans.insert(root.clone(), root_scan);
        Self {
            backend,
            root: root.clone(),
            scans,
        }
    }

    /// Materialize `node` and any ancestors not yet joined.
    ///
    /// Nodes missing from `kinds` are joined as restrictions.
    pub fn materialize(
        &mut self,
        query: &mut B::Query,
        node: &JoinNode,
        kinds: &HashMap<JoinNode, JoinKind>,
    ) -> Result<B::Scan, Error> {
        if let Some(scan) = self.scans.get(node) {
            return Ok(scan.clone());
        }

        let (parent, relationship) = match (node.parent(), node.relationship()) {
            (Some(parent), Some(relationship)) => (parent, relationship),
            _ => {
                return Err(Error::Configuration(format!(
                    "join node {} is not reachable from root {}",
                    node.id(),
                    self.root.id()
                )))
            }
        };

        let parent_scan = self.materialize(query, parent, kinds)?;
        let kind = kinds.get(node).copied().unwrap_or(JoinKind::RESTRICTION);
        trace!(
            node = node.id(),
            parent = parent.id(),
            relation = relationship.attribute(),
            inner = kind.inner,
            fetch = kind.fetch,
            "materializing join"
        );

        let scan = self
            .backend
            .join(query, &parent_scan, relationship, node.entity(), kind)?;
        self.scans.insert(node.clone(), scan.clone());
        Ok(scan)
    }

    /// Materialize every node in order.
    pub fn materialize_all<'n>(
        &mut self,
        query: &mut B::Query,
        nodes: impl IntoIterator<Item = &'n JoinNode>,
        kinds: &HashMap<JoinNode, JoinKind>,
    ) -> Result<(), Error> {
        for node in nodes {
            self.materialize(query, node, kinds)?;
        }
        Ok(())
    }

    /// Scan of an already materialized node.
    pub fn get(&self, node: &JoinNode) -> Option<&B::Scan> {
        self.scans.get(node)
    }

    /// Scan of a node, failing if it was never materialized.
    pub fn scan(&self, node: &JoinNode) -> Result<&B::Scan, Error> {
        self.scans.get(node).ok_or_else(|| {
            Error::Configuration(format!("join node {} was not materialized", node.id()))
        })
    }

    /// Number of materialized nodes, root included.
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    /// Always false: the root is materialized on creation.
    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}
