//! Module interface, registry, and the built-in reference module types.
//!
//! Every module kind shares one lifecycle: construct from parameters, declare
//! inputs and outputs, then execute once per trajectory. See [`Module`].

pub mod builtin;
pub mod executor;
pub mod registry;

pub use executor::*;
pub use registry::{create_default_registry, ModuleFactory, ModuleRegistry};
