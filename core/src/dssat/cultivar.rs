//! Cultivar catalogue lookups against the engine's Genotype files.

use crate::{config::DssatConfig, crop::Crop};
use std::path::{Path, PathBuf};

pub fn catalogue_path(home: &Path, config: &DssatConfig, crop: &Crop) -> PathBuf {
    home.join("Genotype").join(crop.cultivar_file(&config.version))
}

/// `Some(true/false)` when the catalogue could be read, `None` otherwise.
///
/// Cultivar rows start with the six-character code; `!` lines are
/// comments and `@` lines are headers.
pub fn is_known(catalogue: &Path, cultivar: &str) -> Option<bool> {
    let text = std::fs::read_to_string(catalogue).ok()?;
    let known = text
        .lines()
        .filter(|l| !l.starts_with('!') && !l.starts_with('@') && !l.starts_with('*'))
        .filter_map(|l| l.split_whitespace().next())
        .any(|code| code.eq_ignore_ascii_case(cultivar));
    Some(known)
}
