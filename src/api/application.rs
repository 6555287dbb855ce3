use serde_json::Value;
use std::sync::Arc;

use crate::catalog::ModuleCatalog;
use crate::core::{GlobalContext, RunSummary, Scheduler, StopSignal};
use crate::error::{ApplicationError, ApplicationResult};
use crate::graph::{build_graph, DependencyGraph, ExecutionPlan};
use crate::modules::{create_default_registry, ModuleRegistry, ModuleType};
use crate::params::{GlobalPar, ModuleEntry};

/// Orchestrator facade: declare modules, set parameters, run.
pub struct Application {
    par: GlobalPar,
    catalog: ModuleCatalog,
    stop: StopSignal,
    summary: Option<RunSummary>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Application with every built-in module type registered.
    pub fn new() -> Self {
        Self::with_registry(create_default_registry())
    }

    pub fn with_registry(registry: ModuleRegistry) -> Self {
        Self {
            par: GlobalPar::default(),
            catalog: ModuleCatalog::new(Arc::new(registry)),
            stop: StopSignal::new(),
            summary: None,
        }
    }

    pub fn set_par(&mut self, par: GlobalPar) -> ApplicationResult<()> {
        par.validate()?;
        tracing::info!(run_id = %par.run_id, "global parameters set");
        self.par = par;
        Ok(())
    }

    pub fn par(&self) -> &GlobalPar {
        &self.par
    }

    /// Declare a typed module, e.g. `app.create_module::<LoadNersc>("gauge", par)`.
    pub fn create_module<T: ModuleType>(&mut self, name: &str, par: T::Par) -> ApplicationResult<()> {
        let params = serde_json::to_value(&par).map_err(|e| {
            ApplicationError::InvalidParameters {
                module: name.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.create_module_from(name, T::TYPE_ID, params)
    }

    /// Declare a module by type identifier with an untyped parameter payload.
    pub fn create_module_from(
        &mut self,
        name: &str,
        module_type: &str,
        params: Value,
    ) -> ApplicationResult<()> {
        self.catalog
            .add_module(name, module_type, params, Vec::new())?;
        tracing::info!(module = %name, module_type = %module_type, "module created");
        Ok(())
    }

    /// Declare every module listed in a parameter file.
    pub fn load_modules(&mut self, entries: &[ModuleEntry]) -> ApplicationResult<()> {
        for entry in entries {
            self.create_module_from(&entry.id, &entry.module_type, entry.options.clone())?;
        }
        Ok(())
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Handle that aborts a run in progress when triggered.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Summary of the last run, including a failed one.
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn build_graph(&self) -> ApplicationResult<DependencyGraph> {
        build_graph(&self.catalog)
    }

    /// The execution plan for `graph`: loaded from the schedule file when one
    /// exists and saving is off, computed (and saved if asked) otherwise.
    pub fn schedule(&self, graph: &DependencyGraph) -> ApplicationResult<ExecutionPlan> {
        match &self.par.schedule_file {
            Some(path) if !self.par.save_schedule && path.exists() => {
                let plan = ExecutionPlan::load(graph, path)?;
                tracing::info!(path = %path.display(), "schedule loaded");
                Ok(plan)
            }
            Some(path) if self.par.save_schedule => {
                let plan = ExecutionPlan::compute(graph)?;
                plan.save(path)?;
                tracing::info!(path = %path.display(), "schedule saved");
                Ok(plan)
            }
            _ => ExecutionPlan::compute(graph),
        }
    }

    /// Build, validate and execute the graph for every trajectory.
    ///
    /// Stops at the first failed trajectory and returns its error; the
    /// summary, including completed module records, stays available through
    /// [`summary`](Self::summary).
    pub async fn run(&mut self) -> ApplicationResult<()> {
        self.summary = None;
        let graph = self.build_graph()?;

        if let Some(path) = &self.par.graph_file {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, graph.to_dot())?;
            tracing::info!(path = %path.display(), "dependency graph written");
        }

        let plan = self.schedule(&graph)?;
        tracing::info!(order = ?plan.order(), "execution plan ready");

        let mut summary = RunSummary {
            run_id: self.par.run_id.clone(),
            plan: plan.order().to_vec(),
            reports: Vec::new(),
        };
        let scheduler = Scheduler::new(&self.catalog, self.par.scheduler.clone())
            .with_stop_signal(self.stop.clone());
        let follow_plan = self.par.scheduler.max_parallel <= 1 || self.par.schedule_file.is_some();

        let mut failure = None;
        for trajectory in self.par.trajectory.trajectories() {
            let context = GlobalContext::initialize(&self.par, trajectory);
            tracing::info!(trajectory, "trajectory started");

            let mut report = if follow_plan {
                scheduler.execute_plan(&graph, &plan, &context).await
            } else {
                scheduler.execute(&graph, &context).await
            };
            report.result_files = context.teardown();

            let error = report.take_error();
            summary.reports.push(report);
            if let Some(e) = error {
                failure = Some(e);
                break;
            }
        }

        self.summary = Some(summary);
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
