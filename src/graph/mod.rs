//! Dependency graph construction, validation and traversal.
//!
//! The [`DependencyGraph`] is built from a [`ModuleCatalog`](crate::catalog::ModuleCatalog)
//! by [`build_graph`]. Node indices equal catalog registration positions, so the
//! [`Scheduler`](crate::core::Scheduler) works on plain integer indices.

pub mod builder;
pub mod traversal;
pub mod types;
pub mod validator;

pub use builder::*;
pub use traversal::{ExecutionPlan, ReadyQueue};
pub use types::*;
pub use validator::find_cycle;
