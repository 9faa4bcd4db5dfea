//! Handler configuration.

use crate::backend::QueryBackend;
use crate::join::JoinNode;
use crate::restriction::{Restriction, RestrictionMapping};
use crate::sort::SortDefinition;

/// What to do with a sort identifier that has no configured sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownSortPolicy {
    /// Drop the sort and keep compiling.
    #[default]
    Ignore,
    /// Fail with [`crate::Error::UnknownSort`].
    Reject,
}

/// Options applied to every compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Handling of unconfigured sort identifiers.
    pub unknown_sort: UnknownSortPolicy,
}

impl CompileOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unknown sort policy.
    pub fn with_unknown_sort(mut self, policy: UnknownSortPolicy) -> Self {
        self.unknown_sort = policy;
        self
    }
}

/// Configuration of a criteria query handler.
///
/// `C` is the criteria record, `S` the sort identifier type and `B` the
/// backend. Built once and then shared by every compilation.
pub struct HandlerConfig<C, S, B: QueryBackend> {
    pub(crate) root: JoinNode,
    pub(crate) id_column: String,
    pub(crate) restrictions: Vec<Box<dyn Restriction<C, B>>>,
    pub(crate) sorts: Vec<SortDefinition<S>>,
    pub(crate) options: CompileOptions,
}

impl<C, S, B: QueryBackend> HandlerConfig<C, S, B> {
    /// Create a configuration rooted at `root`, whose identity is `id_column`.
    pub fn new(root: &JoinNode, id_column: impl Into<String>) -> Self {
        Self {
            root: root.clone(),
            id_column: id_column.into(),
            restrictions: Vec::new(),
            sorts: Vec::new(),
            options: CompileOptions::default(),
        }
    }

    /// Add a restriction mapping.
    pub fn restrict<V>(self, mapping: RestrictionMapping<C, B, V>) -> Self
    where
        B: 'static,
        C: 'static,
        V: 'static,
    {
        self.with_restriction(Box::new(mapping))
    }

    /// Add a type-erased restriction.
    pub fn with_restriction(mut self, restriction: Box<dyn Restriction<C, B>>) -> Self {
        self.restrictions.push(restriction);
        self
    }

    /// Add a sort definition.
    pub fn sort(mut self, sort: SortDefinition<S>) -> Self {
        self.sorts.push(sort);
        self
    }

    /// Set the compile options.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Root join node.
    pub fn root(&self) -> &JoinNode {
        &self.root
    }

    /// Identity column of the root entity.
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Configured restrictions.
    pub fn restrictions(&self) -> &[Box<dyn Restriction<C, B>>] {
        &self.restrictions
    }

    /// Configured sorts.
    pub fn sorts(&self) -> &[SortDefinition<S>] {
        &self.sorts
    }

    /// Compile options.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }
}
