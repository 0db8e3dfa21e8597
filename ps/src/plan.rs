//! PlanStore - ordered step lists as line-delimited files

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::fsutil::write_atomic;
use crate::step::Step;
use crate::validate_plan_id;

/// Plan files, one per plan id, one step per line
#[derive(Debug, Clone)]
pub struct PlanStore {
    base_path: PathBuf,
}

impl PlanStore {
    /// Open or create a plan store at the given directory
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| StoreError::io(&base_path, e))?;
        debug!(?base_path, "Opened plan store");
        Ok(Self { base_path })
    }

    /// File backing a plan
    pub fn path_for(&self, id: &str) -> StoreResult<PathBuf> {
        validate_plan_id(id)?;
        Ok(self.base_path.join(id))
    }

    /// Check whether a plan file exists
    pub fn exists(&self, id: &str) -> bool {
        self.path_for(id).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Write a plan, replacing any existing plan with the same id
    pub fn create(&self, id: &str, steps: &[Step]) -> StoreResult<()> {
        debug!(%id, step_count = steps.len(), "create: called");
        let path = self.path_for(id)?;
        write_atomic(&path, render(steps)?.as_bytes())?;
        info!(%id, step_count = steps.len(), "Plan written");
        Ok(())
    }

    /// Read a plan's steps in order, skipping blank lines
    pub fn read(&self, id: &str) -> StoreResult<Vec<Step>> {
        debug!(%id, "read: called");
        let path = self.path_for(id)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%id, "read: plan file missing");
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        let steps: Vec<Step> = content.lines().filter_map(Step::parse_line).collect();
        debug!(%id, step_count = steps.len(), "read: parsed steps");
        Ok(steps)
    }

    /// Replace every step's annotation with `instruction` and rewrite the file
    ///
    /// Repeated calls overwrite the annotation rather than accumulating.
    pub fn append_instruction(&self, id: &str, instruction: &str) -> StoreResult<Vec<Step>> {
        debug!(%id, %instruction, "append_instruction: called");
        let steps: Vec<Step> = self.read(id)?.iter().map(|s| s.annotated(instruction)).collect();
        self.create(id, &steps)?;
        Ok(steps)
    }

    /// List plan ids, sorted
    pub fn list(&self) -> StoreResult<Vec<String>> {
        debug!("list: called");
        let entries = fs::read_dir(&self.base_path).map_err(|e| StoreError::io(&self.base_path, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.base_path, e))?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_plan_id(&name).is_ok() {
                ids.push(name);
            }
        }

        ids.sort();
        Ok(ids)
    }
}

fn render(steps: &[Step]) -> StoreResult<String> {
    let mut out = String::new();
    for step in steps {
        out.push_str(&step.to_line()?);
        out.push('\n');
    }
    Ok(out)
}
