//! Short engine home staging.
//!
//! The engine stores directory paths in fixed-width fields and silently
//! truncates long ones, so a home deep inside a package tree breaks it.
//! Staging links every entry of the real home into `<tmp>/DSSAT<ver>/`.

use crate::config::DssatConfig;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
pub fn stage_short_home(config: &DssatConfig, tmp: &Path) -> io::Result<PathBuf> {
    let staged = tmp.join(format!("DSSAT{}", config.version));
    std::fs::create_dir_all(&staged)?;
    for entry in std::fs::read_dir(&config.home)? {
        let entry = entry?;
        let link = staged.join(entry.file_name());
        // Replace stale links from an earlier install; ignore if absent.
        match std::fs::remove_file(&link) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        match std::os::unix::fs::symlink(entry.path(), &link) {
            // Another process staged the same entry between our remove and link.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            other => other?,
        }
    }
    log::debug!("staged engine home {} -> {}", config.home.display(), staged.display());
    Ok(staged)
}

#[cfg(not(unix))]
pub fn stage_short_home(config: &DssatConfig, _tmp: &Path) -> io::Result<PathBuf> {
    Ok(config.home.clone())
}
