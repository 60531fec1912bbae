//! Soil profile files: structural checks and re-keying.
//!
//! A profile starts at a line beginning with `*` followed by its 10-char
//! id. The optional `*SOILS` line is the file header, not a profile.

use crate::error::{GsError, GsResult};
use std::path::Path;

/// Profile id every run's SOIL.SOL uses. The experiment file's field row points here.
pub const PROFILE_ID: &str = "IB00000001";

const FILE_HEADER: &str = "*SOILS: the upper layer of earth in which plants grow\n\n";

fn is_profile_line(line: &str) -> bool {
    line.starts_with('*')
        && !line
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("*SOILS"))
}

pub fn count_profiles(text: &str) -> usize {
    text.lines().filter(|l| is_profile_line(l)).count()
}

pub fn count_profiles_in_file(path: &Path) -> GsResult<usize> {
    let text = std::fs::read_to_string(path).map_err(|e| GsError::SoilUnreadable {
        path:   path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(count_profiles(&text))
}

/// Render SOIL.SOL: the file header plus the single profile, its id
/// replaced by [`PROFILE_ID`]. Anything before the profile line is dropped.
pub fn render_soil_file(profile_text: &str) -> String {
    let mut out = String::from(FILE_HEADER);
    let mut in_profile = false;
    for line in profile_text.lines() {
        if !in_profile {
            if !is_profile_line(line) {
                continue;
            }
            in_profile = true;
            out.push('*');
            out.push_str(PROFILE_ID);
            out.push_str(line.get(11..).unwrap_or(""));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
