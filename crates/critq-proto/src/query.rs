//! Query definitions: the per-call criteria and sort list.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::sort::SortInfo;

/// Defines the restriction and sort portion of a query.
///
/// `C` is the caller's criteria record and `S` the sort identifier type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDefinition<C, S> {
    /// Criteria record; absent fields contribute no restriction.
    pub criteria: C,
    /// Sorts in priority order, the first being the primary key.
    #[serde(default = "Vec::new")]
    pub sorts: Vec<SortInfo<S>>,
}

impl<C, S> QueryDefinition<C, S> {
    /// Create an unsorted query definition.
    pub fn new(criteria: C) -> Self {
        Self {
            criteria,
            sorts: Vec::new(),
        }
    }

    /// Append an ascending sort.
    pub fn with_sort(mut self, identifier: S) -> Self {
        self.sorts.push(SortInfo::asc(identifier));
        self
    }

    /// Append a sort with an explicit direction.
    pub fn with_sort_info(mut self, sort: SortInfo<S>) -> Self {
        self.sorts.push(sort);
        self
    }

    /// Append several ascending sorts.
    pub fn with_sorts(mut self, identifiers: impl IntoIterator<Item = S>) -> Self {
        self.sorts.extend(identifiers.into_iter().map(SortInfo::asc));
        self
    }
}

impl<C: DeserializeOwned, S: DeserializeOwned> QueryDefinition<C, S> {
    /// Decode a query definition from JSON.
    pub fn from_json(input: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(input)?)
    }
}
