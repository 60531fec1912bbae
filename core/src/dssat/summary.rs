//! Parse the engine's spatial-mode summary table from stdout.
//!
//! The engine prints a two-line header (names, then units ending in
//! `t/ha`), then one row per simulated season. Blank lines and the
//! `Crop ...` banner lines are noise.

use crate::engine::{EngineOutput, OutputRecord, OutputValue};
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

pub const SUMMARY_COLUMNS: [&str; 15] = [
    "RUN", "CR", "TRT", "FLO", "MAT", "TOPWT", "HARWT", "RAIN", "TIRR", "CET", "PESW", "TNUP",
    "TNLF", "TSON", "TSOC",
];

/// Rows are dated at maturity: planting + MAT days, or planting when
/// MAT is missing (the engine prints -99 for failed crops).
pub fn parse_summary(stdout: &str, planting_date: NaiveDate) -> EngineOutput {
    let mut output = EngineOutput::new(SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect());
    let mut skip_units = false;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if skip_units {
            skip_units = false;
            if trimmed.contains("t/ha") {
                continue;
            }
        }
        if trimmed.starts_with("RUN") {
            skip_units = true;
            continue;
        }
        if trimmed.contains("Crop") {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != SUMMARY_COLUMNS.len() || fields[0].parse::<u32>().is_err() {
            log::trace!("summary: ignoring line '{trimmed}'");
            continue;
        }

        let values: BTreeMap<String, OutputValue> = SUMMARY_COLUMNS
            .iter()
            .zip(&fields)
            .map(|(name, raw)| (name.to_string(), OutputValue::parse(raw)))
            .collect();
        let date = values
            .get("MAT")
            .and_then(OutputValue::as_f64)
            .filter(|mat| *mat > 0.0)
            .and_then(|mat| planting_date.checked_add_days(Days::new(mat as u64)))
            .unwrap_or(planting_date);
        output.push(OutputRecord { date, values });
    }

    output.records.sort_by_key(|r| r.date);
    output
}

/// Last few lines of engine output, for failure messages.
pub fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
