//! Execution reports: one per trajectory, collected into a [`RunSummary`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ApplicationError;
use crate::modules::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Aborted,
}

/// Outcome of one module execution.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleRecord {
    pub name: String,
    pub module_type: String,
    pub status: ModuleStatus,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Products published by this module.
    pub outputs: Vec<String>,
    /// Upstream products freed once this module finished.
    pub released: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Execution report for one trajectory.
#[derive(Debug, Serialize)]
pub struct ExecutionReport {
    pub run_id: String,
    pub trajectory: u32,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records: Vec<ModuleRecord>,
    pub peak_live_products: usize,
    pub result_files: Vec<PathBuf>,
    /// Terminal products, kept only when retention is enabled. Also filled
    /// for failed or aborted runs with whatever completed before the stop.
    #[serde(skip)]
    pub retained: HashMap<String, Arc<Product>>,
    #[serde(skip)]
    error: Option<ApplicationError>,
}

impl ExecutionReport {
    pub fn new(run_id: impl Into<String>, trajectory: u32) -> Self {
        Self {
            run_id: run_id.into(),
            trajectory,
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            records: Vec::new(),
            peak_live_products: 0,
            result_files: Vec::new(),
            retained: HashMap::new(),
            error: None,
        }
    }

    pub(crate) fn finish(&mut self, status: RunStatus, error: Option<ApplicationError>) {
        self.status = status;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Name of the module whose failure stopped the run.
    pub fn failed_module(&self) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.status == ModuleStatus::Failed)
            .map(|r| r.name.as_str())
    }

    /// Modules that completed, in execution order.
    pub fn executed_names(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.status == ModuleStatus::Succeeded)
            .map(|r| r.name.as_str())
            .collect()
    }

    pub fn record(&self, name: &str) -> Option<&ModuleRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn error(&self) -> Option<&ApplicationError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<ApplicationError> {
        self.error.take()
    }
}

/// Reports for every trajectory of a run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    /// Execution order used for every trajectory.
    pub plan: Vec<String>,
    pub reports: Vec<ExecutionReport>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        !self.reports.is_empty() && self.reports.iter().all(ExecutionReport::is_success)
    }

    pub fn last_report(&self) -> Option<&ExecutionReport> {
        self.reports.last()
    }
}
