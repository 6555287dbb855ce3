//! Scheduler: runs the modules of a validated graph in dependency order.
//!
//! The [`Scheduler`] walks a stable topological order, feeds each module its
//! inputs from the [`ProductStore`], publishes the declared outputs, and frees
//! every product as soon as its last consumer has finished. A module failure
//! stops the run at once; nothing is retried.

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use petgraph::stable_graph::NodeIndex;

use super::global_context::GlobalContext;
use super::product_store::ProductStore;
use super::report::{ExecutionReport, ModuleRecord, ModuleStatus, RunStatus};
use super::stop_signal::StopSignal;
use crate::catalog::ModuleCatalog;
use crate::error::{ApplicationError, ApplicationResult, ModuleError};
use crate::graph::{DependencyGraph, ExecutionPlan, ModuleNode, ProductKey, ReadyQueue};
use crate::modules::ModuleInputs;

/// Configuration for the scheduler
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Modules from one ready generation run concurrently up to this many.
    /// `1` keeps the strictly sequential order.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    /// Keep products nobody consumes and hand them back in the report.
    #[serde(default)]
    pub retain_outputs: bool,
}

fn default_max_parallel() -> usize {
    1
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            retain_outputs: false,
        }
    }
}

struct ModuleRun {
    idx: NodeIndex,
    record: ModuleRecord,
    result: ApplicationResult<()>,
}

struct Published {
    outputs: Vec<String>,
    released: Vec<String>,
}

/// Executes a [`DependencyGraph`] against the modules of a [`ModuleCatalog`].
pub struct Scheduler<'a> {
    catalog: &'a ModuleCatalog,
    config: SchedulerConfig,
    stop: Option<StopSignal>,
}

impl<'a> Scheduler<'a> {
    pub fn new(catalog: &'a ModuleCatalog, config: SchedulerConfig) -> Self {
        Self {
            catalog,
            config,
            stop: None,
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Execute every module of `graph` once.
    ///
    /// Sequential unless `max_parallel > 1`, in which case each ready
    /// generation is run concurrently and recorded in registration order.
    pub async fn execute(&self, graph: &DependencyGraph, context: &GlobalContext) -> ExecutionReport {
        if self.config.max_parallel > 1 {
            return self.execute_generations(graph, context).await;
        }
        match ExecutionPlan::compute(graph) {
            Ok(plan) => self.execute_plan(graph, &plan, context).await,
            Err(e) => {
                let mut report = ExecutionReport::new(context.run_id(), context.trajectory());
                report.finish(RunStatus::Failed, Some(e));
                report
            }
        }
    }

    /// Execute the modules of `plan` in its exact order.
    pub async fn execute_plan(
        &self,
        graph: &DependencyGraph,
        plan: &ExecutionPlan,
        context: &GlobalContext,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::new(context.run_id(), context.trajectory());
        let store = ProductStore::new(self.config.retain_outputs);
        let counts = graph.consumer_counts();

        tracing::info!(
            trajectory = context.trajectory(),
            modules = plan.len(),
            "starting execution"
        );

        for &idx in plan.indices() {
            if let Err(e) = self.check_stop() {
                return self.finish(report, &store, Some(e));
            }
            let node = match graph.node(idx) {
                Ok(node) => node,
                Err(e) => return self.finish(report, &store, Some(e)),
            };

            let run = self.run_module(idx, node, &store, &counts, context).await;
            report.records.push(run.record);
            if let Err(e) = run.result {
                return self.finish(report, &store, Some(e));
            }
        }

        self.finish(report, &store, None)
    }

    async fn execute_generations(
        &self,
        graph: &DependencyGraph,
        context: &GlobalContext,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::new(context.run_id(), context.trajectory());
        let store = ProductStore::new(self.config.retain_outputs);
        let counts = graph.consumer_counts();
        let mut queue = ReadyQueue::new(graph);

        tracing::info!(
            trajectory = context.trajectory(),
            modules = graph.len(),
            max_parallel = self.config.max_parallel,
            "starting execution"
        );

        loop {
            if let Err(e) = self.check_stop() {
                return self.finish(report, &store, Some(e));
            }

            let batch = queue.pop_batch(self.config.max_parallel);
            if batch.is_empty() {
                break;
            }
            let nodes = match batch
                .iter()
                .map(|idx| graph.node(*idx).map(|node| (*idx, node)))
                .collect::<ApplicationResult<Vec<_>>>()
            {
                Ok(nodes) => nodes,
                Err(e) => return self.finish(report, &store, Some(e)),
            };

            let runs = join_all(
                nodes
                    .iter()
                    .map(|(idx, node)| self.run_module(*idx, node, &store, &counts, context)),
            )
            .await;

            let mut failure = None;
            for run in runs {
                report.records.push(run.record);
                match run.result {
                    Ok(()) => queue.complete(run.idx),
                    Err(e) => {
                        if failure.is_none() {
                            failure = Some(e);
                        }
                    }
                }
            }
            if failure.is_some() {
                return self.finish(report, &store, failure);
            }
        }

        if queue.remaining() > 0 {
            let e = ApplicationError::Internal(format!(
                "{} modules never became ready",
                queue.remaining()
            ));
            return self.finish(report, &store, Some(e));
        }
        self.finish(report, &store, None)
    }

    fn check_stop(&self) -> ApplicationResult<()> {
        match &self.stop {
            Some(stop) if stop.is_triggered() => {
                Err(ApplicationError::Aborted("stop signal received".to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn run_module(
        &self,
        idx: NodeIndex,
        node: &ModuleNode,
        store: &ProductStore,
        counts: &HashMap<ProductKey, usize>,
        context: &GlobalContext,
    ) -> ModuleRun {
        let started_at = Utc::now();
        let clock = Instant::now();

        tracing::info!(
            module = %node.name,
            module_type = %node.module_type,
            trajectory = context.trajectory(),
            "executing module"
        );
        let result = self.invoke(node, store, counts, context).await;
        let elapsed_ms = clock.elapsed().as_millis() as u64;

        let (status, outputs, released, error, result) = match result {
            Ok(published) => {
                tracing::debug!(module = %node.name, elapsed_ms, "module finished");
                (
                    ModuleStatus::Succeeded,
                    published.outputs,
                    published.released,
                    None,
                    Ok(()),
                )
            }
            Err(e) => {
                tracing::error!(module = %node.name, error = %e, "module failed");
                (
                    ModuleStatus::Failed,
                    Vec::new(),
                    Vec::new(),
                    Some(e.to_string()),
                    Err(e),
                )
            }
        };

        ModuleRun {
            idx,
            record: ModuleRecord {
                name: node.name.clone(),
                module_type: node.module_type.clone(),
                status,
                started_at,
                elapsed_ms,
                outputs,
                released,
                error,
            },
            result,
        }
    }

    /// Acquire inputs, execute, check and publish outputs, then release inputs.
    async fn invoke(
        &self,
        node: &ModuleNode,
        store: &ProductStore,
        counts: &HashMap<ProductKey, usize>,
        context: &GlobalContext,
    ) -> ApplicationResult<Published> {
        let decl = self.catalog.get_module(&node.name)?;

        let mut inputs = ModuleInputs::new();
        for key in &node.inputs {
            let product = store
                .get(key)
                .ok_or_else(|| ApplicationError::MissingProduct {
                    consumer: node.name.clone(),
                    product: key.to_string(),
                })?;
            inputs.insert(key.output.clone(), product);
        }

        let outputs = decl
            .instance()
            .execute(&node.name, &inputs, context)
            .await
            .map_err(|source| ApplicationError::ModuleFailed {
                module: node.name.clone(),
                source,
            })?;
        drop(inputs);

        let produced = outputs.into_products();
        let failed = |source: ModuleError| ApplicationError::ModuleFailed {
            module: node.name.clone(),
            source,
        };
        if let Some((name, _)) = produced
            .iter()
            .find(|(name, _)| !node.outputs.iter().any(|o| &o.name == name))
        {
            return Err(failed(ModuleError::UndeclaredOutput(name.clone())));
        }
        if let Some(missing) = node
            .outputs
            .iter()
            .find(|o| !produced.iter().any(|(name, _)| name == &o.name))
        {
            return Err(failed(ModuleError::MissingOutput(missing.name.clone())));
        }

        let mut published = Vec::with_capacity(produced.len());
        for (name, product) in produced {
            let key = ProductKey::new(&node.name, &name);
            let consumers = counts.get(&key).copied().unwrap_or(0);
            store.insert(key, product, consumers);
            published.push(name);
        }

        let mut released = Vec::new();
        for key in &node.inputs {
            if store.release_one(key) {
                released.push(key.output.clone());
            }
        }

        Ok(Published {
            outputs: published,
            released,
        })
    }

    fn finish(
        &self,
        mut report: ExecutionReport,
        store: &ProductStore,
        error: Option<ApplicationError>,
    ) -> ExecutionReport {
        report.peak_live_products = store.peak_live();
        let dropped = store.clear();
        report.retained = store.take_retained();

        match error {
            None => {
                tracing::info!(
                    trajectory = report.trajectory,
                    modules = report.records.len(),
                    peak_live_products = report.peak_live_products,
                    "execution completed"
                );
                report.finish(RunStatus::Completed, None);
            }
            Some(e) => {
                let status = match e {
                    ApplicationError::Aborted(_) => RunStatus::Aborted,
                    _ => RunStatus::Failed,
                };
                tracing::warn!(
                    trajectory = report.trajectory,
                    completed = report.executed_names().len(),
                    released = dropped,
                    error = %e,
                    "execution stopped"
                );
                report.finish(status, Some(e));
            }
        }
        report
    }
}
