use thiserror::Error;

/// Module-level errors
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Missing input product: {0}")]
    MissingInput(String),
    #[error("Declared output not produced: {0}")]
    MissingOutput(String),
    #[error("Output produced but never declared: {0}")]
    UndeclaredOutput(String),
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ModuleError {
    fn from(e: serde_json::Error) -> Self {
        ModuleError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for ModuleError {
    fn from(e: std::io::Error) -> Self {
        ModuleError::Io(e.to_string())
    }
}
