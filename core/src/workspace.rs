//! Per-treatment work areas.
//!
//! RULE: every engine invocation gets its own directory. The engine reads
//! and writes fixed file names, so a shared directory would clobber files.

use crate::types::LocationId;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct WorkArea {
    dir:  Option<TempDir>,
    path: PathBuf,
    keep: bool,
}

impl WorkArea {
    /// Create a fresh, uniquely named directory under `root`.
    pub fn allocate(root: &Path, run_id: &str, location_id: LocationId, keep: bool) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let short_run = run_id.get(..8).unwrap_or(run_id);
        let dir = tempfile::Builder::new()
            .prefix(&format!("dssatrun-{short_run}-{location_id:02}-"))
            .tempdir_in(root)?;
        let path = dir.path().to_path_buf();
        Ok(Self { dir: Some(dir), path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkArea {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else { return };
        if self.keep {
            let kept = dir.keep();
            log::debug!("keeping work area {}", kept.display());
        } else if let Err(e) = dir.close() {
            log::warn!("failed to remove work area {}: {e}", self.path.display());
        }
    }
}
