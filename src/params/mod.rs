//! Run parameters: the `global` section and optional module declarations.
//!
//! Parameter files are YAML, JSON or TOML and deserialize into
//! [`RunParameters`] via [`parse_parameters`].

pub mod parser;
pub mod schema;

pub use parser::{parse_parameters, read_parameters_file, ParameterFormat};
pub use schema::*;
