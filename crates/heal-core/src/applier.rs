use crate::event::HealEvent;
use crate::io::atomic_write;
use crate::types::{ApplyStatus, Fix};
use std::path::{Path, PathBuf};

/// Renders fixes as SQL scripts for an operator to run.
///
/// There is no database connection to execute them with, so every fix comes
/// back [`ApplyStatus::NotApplied`], whether or not the script was written.
pub struct ScriptApplier {
    dir: PathBuf,
    project_ref: String,
}

impl ScriptApplier {
    pub fn new(dir: impl AsRef<Path>, project_ref: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            project_ref: project_ref.into(),
        }
    }

    pub fn script_path(&self, fix: &Fix) -> PathBuf {
        self.dir.join(&fix.file_name)
    }

    pub fn apply(&self, fix: &Fix, emit: &mut dyn FnMut(&HealEvent)) -> ApplyStatus {
        let path = self.script_path(fix);
        match atomic_write(&path, fix.sql.as_bytes()) {
            Ok(()) => emit(&HealEvent::ScriptWritten { path }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to write fix script");
                emit(&HealEvent::ScriptWriteFailed {
                    path,
                    error: e.to_string(),
                });
            }
        }
        emit(&HealEvent::ManualApplyRequired {
            project_ref: self.project_ref.clone(),
            sql: fix.sql.clone(),
        });
        ApplyStatus::NotApplied
    }
}
