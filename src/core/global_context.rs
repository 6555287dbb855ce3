use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{ModuleError, ModuleResult};
use crate::params::GlobalPar;

/// Run-wide, read-only context handed to every module execution.
///
/// One context exists per trajectory. Modules may write result files through
/// it; the context only records which files were written.
#[derive(Debug)]
pub struct GlobalContext {
    run_id: String,
    trajectory: u32,
    output_dir: PathBuf,
    written: Mutex<Vec<PathBuf>>,
}

impl GlobalContext {
    pub fn initialize(par: &GlobalPar, trajectory: u32) -> Self {
        tracing::debug!(run_id = %par.run_id, trajectory, "global context initialized");
        Self {
            run_id: par.run_id.clone(),
            trajectory,
            output_dir: par.output_dir.clone(),
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn trajectory(&self) -> u32 {
        self.trajectory
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `output_dir/<stem>.<trajectory>.json`
    pub fn result_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}.json", stem, self.trajectory))
    }

    /// Write `value` as pretty JSON to [`result_path`](Self::result_path).
    ///
    /// Data goes to a sibling temporary file that is renamed into place, so an
    /// existing result is never left half-written.
    pub fn write_result(&self, stem: &str, value: &Value) -> ModuleResult<PathBuf> {
        let path = self.result_path(stem);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("json.tmp");
        let file = std::fs::File::create(&tmp)?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        std::io::Write::flush(&mut writer)?;
        drop(writer);

        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(ModuleError::Io(format!(
                "cannot move result into {}: {}",
                path.display(),
                e
            )));
        }

        tracing::debug!(path = %path.display(), "result written");
        self.written.lock().push(path.clone());
        Ok(path)
    }

    pub fn written_files(&self) -> Vec<PathBuf> {
        self.written.lock().clone()
    }

    /// Release the context, returning every result file written through it.
    pub fn teardown(self) -> Vec<PathBuf> {
        let written = self.written.into_inner();
        tracing::debug!(
            trajectory = self.trajectory,
            files = written.len(),
            "global context torn down"
        );
        written
    }
}
