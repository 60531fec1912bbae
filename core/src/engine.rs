//! The external engine boundary.
//!
//! RULES:
//!   - The engine is a black box. The core never models agronomy.
//!   - One simulate() call per treatment, inside that treatment's own work area.
//!   - Engine-level problems come back as EngineFailure, never as a panic
//!     or a GsError. A panic is still caught by the orchestrator.

use crate::{
    controls::EffectiveControls,
    crop::Crop,
    error::EngineFailure,
    treatment::Treatment,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Everything the engine needs to simulate one location.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    pub run_id:     &'a str,
    pub crop:       &'a Crop,
    pub treatment:  &'a Treatment,
    pub controls:   &'a EffectiveControls,
    /// Last date the weather must cover.
    pub season_end: NaiveDate,
}

/// Per-invocation execution context.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    /// Private scratch directory. Never shared with another treatment.
    pub work_dir: &'a Path,
    pub cancel:   &'a CancelToken,
    pub timeout:  Option<Duration>,
}

pub trait SimulationEngine: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    fn simulate(
        &self,
        request: &EngineRequest<'_>,
        context: &EngineContext<'_>,
    ) -> Result<EngineOutput, EngineFailure>;
}

/// Cooperative cancellation flag, cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A single output cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OutputValue {
    Number(f64),
    Text(String),
}

impl OutputValue {
    /// Numbers parse as numbers, everything else is kept as text.
    pub fn parse(raw: &str) -> Self {
        raw.parse::<f64>()
            .map(OutputValue::Number)
            .unwrap_or_else(|_| OutputValue::Text(raw.to_string()))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OutputValue::Number(n) => Some(*n),
            OutputValue::Text(_) => None,
        }
    }
}

/// One dated row of engine output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputRecord {
    pub date:   NaiveDate,
    pub values: BTreeMap<String, OutputValue>,
}

impl OutputRecord {
    pub fn get(&self, column: &str) -> Option<&OutputValue> {
        self.values.get(column)
    }
}

/// Tabular engine output for one location, chronological.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineOutput {
    /// Column names in the engine's own order.
    pub columns: Vec<String>,
    pub records: Vec<OutputRecord>,
}

impl EngineOutput {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, records: Vec::new() }
    }

    pub fn push(&mut self, record: OutputRecord) {
        self.records.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
