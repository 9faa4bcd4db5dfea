//! Sort model: sort identifiers bound to join paths.

use critq_proto::SortDirection;

use crate::backend::QueryBackend;
use crate::error::Error;
use crate::join::JoinNode;

/// Binds a sort identifier to a column of the entity at a join node.
#[derive(Debug, Clone)]
pub struct SortDefinition<S> {
    identifier: S,
    join: JoinNode,
    column: String,
}

impl<S> SortDefinition<S> {
    /// Sort `identifier` orders by `column` of the entity at `join`.
    pub fn new(identifier: S, join: &JoinNode, column: impl Into<String>) -> Self {
        Self {
            identifier,
            join: join.clone(),
            column: column.into(),
        }
    }

    /// Sort identifier.
    pub fn identifier(&self) -> &S {
        &self.identifier
    }

    /// Join node holding the sorted column.
    pub fn join(&self) -> &JoinNode {
        &self.join
    }

    /// Sorted column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Build the order clause against the materialized `scan`.
    pub fn to_order<B: QueryBackend>(
        &self,
        backend: &B,
        scan: &B::Scan,
        direction: SortDirection,
    ) -> Result<B::Order, Error> {
        let path = backend.column(scan, &self.column)?;
        Ok(match direction {
            SortDirection::Asc => backend.asc(&path),
            SortDirection::Desc => backend.desc(&path),
        })
    }
}
