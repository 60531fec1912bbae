//! Result aggregation: one table for the whole run.
//!
//! RULES:
//!   - Rows are ordered by location id, then by each location's own output order.
//!   - Failures are kept in a separate map, never dropped.
//!   - Aggregation keys only on location id, so the same set of results
//!     always aggregates identically whatever order it arrives in.

use crate::{
    engine::{EngineOutput, OutputValue},
    error::{EngineFailure, FailureKind, GsResult},
    types::LocationId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The outcome of one treatment's execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationResult {
    pub location_id: LocationId,
    pub outcome:     Result<EngineOutput, EngineFailure>,
}

impl LocationResult {
    pub fn succeeded(location_id: LocationId, output: EngineOutput) -> Self {
        Self { location_id, outcome: Ok(output) }
    }

    pub fn failed(location_id: LocationId, failure: EngineFailure) -> Self {
        Self { location_id, outcome: Err(failure) }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// One output row tagged with the location that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRow {
    pub location_id: LocationId,
    pub date:        NaiveDate,
    pub values:      BTreeMap<String, OutputValue>,
}

impl ResultRow {
    pub fn get(&self, column: &str) -> Option<&OutputValue> {
        self.values.get(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(OutputValue::as_f64)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregatedResult {
    columns:   Vec<String>,
    rows:      Vec<ResultRow>,
    failures:  BTreeMap<LocationId, EngineFailure>,
    successes: BTreeSet<LocationId>,
}

impl AggregatedResult {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn failures(&self) -> &BTreeMap<LocationId, EngineFailure> {
        &self.failures
    }

    pub fn failure(&self, location_id: LocationId) -> Option<&EngineFailure> {
        self.failures.get(&location_id)
    }

    pub fn rows_for(&self, location_id: LocationId) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(move |r| r.location_id == location_id)
    }

    /// Distinct location ids that appear in the rows, ascending.
    pub fn location_ids(&self) -> Vec<LocationId> {
        let mut ids: Vec<LocationId> = self.rows.iter().map(|r| r.location_id).collect();
        ids.dedup();
        ids
    }

    /// Locations whose engine run completed, including ones with no rows.
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn was_cancelled(&self) -> bool {
        self.failures.values().any(|f| f.kind == FailureKind::Cancelled)
    }

    pub fn to_json(&self) -> GsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Merge per-location results into one table.
pub fn aggregate(mut results: Vec<LocationResult>) -> AggregatedResult {
    results.sort_by_key(|r| r.location_id);
    debug_assert!(
        results.windows(2).all(|w| w[0].location_id != w[1].location_id),
        "duplicate location id handed to aggregate()"
    );

    let mut agg = AggregatedResult::default();
    for result in results {
        let location_id = result.location_id;
        match result.outcome {
            Ok(output) => {
                for column in output.columns {
                    if !agg.columns.contains(&column) {
                        agg.columns.push(column);
                    }
                }
                agg.rows.extend(output.records.into_iter().map(|record| ResultRow {
                    location_id,
                    date:   record.date,
                    values: record.values,
                }));
                agg.successes.insert(location_id);
            }
            Err(failure) => {
                agg.failures.insert(location_id, failure);
            }
        }
    }
    agg
}
