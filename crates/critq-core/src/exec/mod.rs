//! In-memory execution of compiled plans.
//!
//! [`PlanExecutor`] evaluates a [`critq_proto::SelectPlan`] against rows held
//! in a [`MemoryStore`], following relations declared in the catalog. It is
//! the reference semantics for plans produced by
//! [`crate::backend::PlanBackend`].

mod evaluate;
mod executor;
mod store;

pub use evaluate::{PredicateEvaluator, RowBinding, SubqueryMembers};
pub use executor::{PlanExecutor, QueryOutput};
pub use store::{EntityRow, MemoryStore};
