//! Sort identifiers and directions.

use serde::{Deserialize, Serialize};

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns whether the sort direction is ascending.
    pub fn is_ascending(&self) -> bool {
        *self == SortDirection::Asc
    }
}

/// Combines a sort identifier with a sort direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortInfo<S> {
    /// Identifier of the configured sort to use.
    pub identifier: S,
    /// Sort direction, ascending when omitted.
    #[serde(default)]
    pub direction: SortDirection,
}

impl<S> SortInfo<S> {
    /// Create a sort in the given direction.
    pub fn new(identifier: S, direction: SortDirection) -> Self {
        Self {
            identifier,
            direction,
        }
    }

    /// Create an ascending sort.
    pub fn asc(identifier: S) -> Self {
        Self::new(identifier, SortDirection::Asc)
    }

    /// Create a descending sort.
    pub fn desc(identifier: S) -> Self {
        Self::new(identifier, SortDirection::Desc)
    }
}
