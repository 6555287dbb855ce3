//! Run-level error types.

use super::ModuleError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error retryability marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorRetryability {
    Retryable,
    NonRetryable,
}

/// Run-level errors
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Unknown module type: {0}")]
    UnknownModuleType(String),
    #[error("Invalid parameters for module '{module}': {reason}")]
    InvalidParameters { module: String, reason: String },
    #[error("Duplicate module name: {0}")]
    DuplicateName(String),
    #[error("Unknown module: {0}")]
    UnknownModule(String),
    #[error("Product '{product}' declared by both '{first}' and '{second}'")]
    DuplicateOutput {
        product: String,
        first: String,
        second: String,
    },
    #[error("Unresolved dependency: module '{consumer}' requires '{missing}'")]
    UnresolvedDependency { consumer: String, missing: String },
    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
    #[error("Missing product '{product}' required by '{consumer}'")]
    MissingProduct { consumer: String, product: String },
    #[error("Module '{module}' failed: {source}")]
    ModuleFailed {
        module: String,
        #[source]
        source: ModuleError,
    },
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("Parameter parse error: {0}")]
    ParameterParse(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Run aborted: {0}")]
    Aborted(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Nothing in the graph or scheduler layer is retried.
    pub fn retryability(&self) -> ErrorRetryability {
        ErrorRetryability::NonRetryable
    }

    /// Whether the error was raised before any module could execute.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ApplicationError::UnknownModuleType(_)
                | ApplicationError::InvalidParameters { .. }
                | ApplicationError::DuplicateName(_)
                | ApplicationError::UnknownModule(_)
                | ApplicationError::DuplicateOutput { .. }
                | ApplicationError::UnresolvedDependency { .. }
                | ApplicationError::CyclicDependency { .. }
                | ApplicationError::InvalidSchedule(_)
                | ApplicationError::ParameterParse(_)
        )
    }
}

impl From<std::io::Error> for ApplicationError {
    fn from(e: std::io::Error) -> Self {
        ApplicationError::Io(e.to_string())
    }
}
