use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::core::scheduler::SchedulerConfig;
use crate::error::{ApplicationError, ApplicationResult};

/// Top-level parameter file layout.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunParameters {
    pub global: GlobalPar,
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

/// Run-wide configuration consumed by [`GlobalContext`](crate::core::GlobalContext).
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GlobalPar {
    #[serde(default = "default_run_id")]
    pub run_id: String,
    #[serde(default)]
    pub trajectory: TrajectoryRange,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Write the dependency graph here in Graphviz DOT format.
    #[serde(default)]
    pub graph_file: Option<PathBuf>,
    /// Schedule file, written when `save_schedule` is set, read otherwise.
    #[serde(default)]
    pub schedule_file: Option<PathBuf>,
    #[serde(default)]
    pub save_schedule: bool,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn default_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for GlobalPar {
    fn default() -> Self {
        Self {
            run_id: default_run_id(),
            trajectory: TrajectoryRange::default(),
            output_dir: default_output_dir(),
            graph_file: None,
            schedule_file: None,
            save_schedule: false,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl GlobalPar {
    pub fn validate(&self) -> ApplicationResult<()> {
        if self.run_id.trim().is_empty() {
            return Err(ApplicationError::ParameterParse(
                "global.run_id must not be empty".to_string(),
            ));
        }
        self.trajectory.validate()?;
        if self.save_schedule && self.schedule_file.is_none() {
            return Err(ApplicationError::ParameterParse(
                "global.save_schedule requires global.schedule_file".to_string(),
            ));
        }
        Ok(())
    }
}

/// Inclusive trajectory range `start..=end` walked by `step`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TrajectoryRange {
    pub start: u32,
    pub end: u32,
    #[serde(default = "default_step")]
    pub step: u32,
}

fn default_step() -> u32 {
    1
}

impl Default for TrajectoryRange {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            step: 1,
        }
    }
}

impl TrajectoryRange {
    pub fn validate(&self) -> ApplicationResult<()> {
        if self.step == 0 {
            return Err(ApplicationError::ParameterParse(
                "global.trajectory.step must be positive".to_string(),
            ));
        }
        if self.end < self.start {
            return Err(ApplicationError::ParameterParse(format!(
                "global.trajectory.end ({}) is before start ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// Trajectory indices in order. Empty for an invalid range.
    pub fn trajectories(&self) -> impl Iterator<Item = u32> {
        let (start, end) = if self.step == 0 || self.end < self.start {
            (1, 0)
        } else {
            (self.start, self.end)
        };
        (start..=end).step_by(self.step.max(1) as usize)
    }
}

/// Untyped module declaration read from a parameter file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModuleEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub module_type: String,
    #[serde(default)]
    pub options: Value,
}
