//! Error types for the orchestrator.
//!
//! - [`ModuleError`]: Errors raised by an individual module (construction or execution).
//! - [`ApplicationError`]: Top-level errors for catalog, graph, scheduling and run lifecycle.
//! - [`ErrorRetryability`]: Retryability marker attached to run-level errors.

pub mod application_error;
pub mod module_error;

pub use application_error::{ApplicationError, ErrorRetryability};
pub use module_error::ModuleError;

/// Convenience alias for run-level results.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
/// Convenience alias for module-level results.
pub type ModuleResult<T> = Result<T, ModuleError>;
