//! # modgraph: module dependency graph and execution scheduler
//!
//! `modgraph` runs a set of named, typed modules whose inputs reference the
//! products of other modules. It resolves those references into a dependency
//! graph, rejects unresolvable or cyclic declarations before anything runs,
//! orders the modules deterministically, and executes them while releasing
//! each intermediate product as soon as its last consumer has finished.
//!
//! - **Catalog**: modules are declared by name and type; instances are built
//!   from a [`ModuleRegistry`] at declaration time.
//! - **Graph**: products resolve to their producing module; duplicate outputs,
//!   unresolved inputs and cycles are reported with the offending names.
//! - **Scheduling**: a stable topological order (ties broken by declaration
//!   order), optionally persisted to a schedule file and reloaded.
//! - **Execution**: reference-counted product store, failure halts the run,
//!   optional bounded parallelism within one ready generation.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use modgraph::modules::builtin::{LoadNersc, LoadNerscPar};
//! use modgraph::{Application, GlobalPar};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = Application::new();
//!     app.set_par(GlobalPar::default()).unwrap();
//!     app.create_module::<LoadNersc>("gauge", LoadNerscPar { file: "./cnfg/ckpoint_lat".into() })
//!         .unwrap();
//!     app.run().await.unwrap();
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod error;
pub mod graph;
pub mod modules;
pub mod params;

pub use api::Application;
pub use catalog::{ModuleCatalog, ModuleDeclaration};
pub use core::{
    ExecutionReport, GlobalContext, ModuleRecord, ModuleStatus, ProductStore, RunStatus,
    RunSummary, Scheduler, SchedulerConfig, StopSignal,
};
pub use error::{ApplicationError, ApplicationResult, ModuleError, ModuleResult};
pub use graph::{build_graph, DependencyGraph, ExecutionPlan, ProductKey};
pub use modules::{
    create_default_registry, Module, ModuleInputs, ModuleOutputs, ModuleRegistry, ModuleType,
    OutputDecl, Product,
};
pub use params::{
    parse_parameters, read_parameters_file, GlobalPar, ModuleEntry, ParameterFormat,
    RunParameters, TrajectoryRange,
};
