pub mod global_context;
pub mod product_store;
pub mod report;
pub mod scheduler;
pub mod stop_signal;

pub use global_context::GlobalContext;
pub use product_store::ProductStore;
pub use report::{ExecutionReport, ModuleRecord, ModuleStatus, RunStatus, RunSummary};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use stop_signal::StopSignal;
