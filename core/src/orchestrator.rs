//! Execution orchestrator: one engine invocation per treatment.
//!
//! RULES:
//!   - Exactly one LocationResult per input treatment, in input order.
//!   - A failure in one treatment never touches another. Engine errors,
//!     IO errors and panics are all captured per location.
//!   - No retries. Engine failures are deterministic given their inputs.
//!   - Every worker is joined before results are handed back.
//!   - Treatments not yet started when the run is cancelled are reported
//!     as Cancelled. Completed results are kept as they are.

use crate::{
    aggregate::LocationResult,
    config::RunConfig,
    controls::EffectiveControls,
    crop::Crop,
    engine::{CancelToken, EngineContext, EngineRequest, SimulationEngine},
    error::EngineFailure,
    treatment::Treatment,
    workspace::WorkArea,
};
use chrono::{Days, NaiveDate};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

pub struct Orchestrator<'a> {
    engine: &'a dyn SimulationEngine,
    config: &'a RunConfig,
    cancel: &'a CancelToken,
    run_id: &'a str,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        engine: &'a dyn SimulationEngine,
        config: &'a RunConfig,
        cancel: &'a CancelToken,
        run_id: &'a str,
    ) -> Self {
        Self { engine, config, cancel, run_id }
    }

    /// Run every treatment and collect the outcomes.
    ///
    /// `latest_date` overrides the season end for all treatments; when absent
    /// each treatment's season ends `season_days` after its planting date.
    pub fn execute_all(
        &self,
        crop: &Crop,
        treatments: &[Treatment],
        controls: &EffectiveControls,
        latest_date: Option<NaiveDate>,
    ) -> Vec<LocationResult> {
        let n = treatments.len();
        if n == 0 {
            return Vec::new();
        }
        let workers = self.config.workers.clamp(1, n);
        log::info!(
            "run {}: executing {n} treatment(s) with {} on {workers} worker(s)",
            self.run_id,
            self.engine.name()
        );

        let cursor = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, LocationResult)>();

        thread::scope(|s| {
            for _ in 0..workers {
                let tx = tx.clone();
                let cursor = &cursor;
                s.spawn(move || loop {
                    let i = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(treatment) = treatments.get(i) else { break };
                    let result = self.execute_one(crop, treatment, controls, latest_date);
                    if tx.send((i, result)).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<LocationResult>> = (0..n).map(|_| None).collect();
        for (i, result) in rx {
            slots[i] = Some(result);
        }

        slots
            .into_iter()
            .zip(treatments)
            .map(|(slot, t)| {
                slot.unwrap_or_else(|| {
                    LocationResult::failed(
                        t.location_id,
                        EngineFailure::system("worker exited without reporting a result"),
                    )
                })
            })
            .collect()
    }

    fn execute_one(
        &self,
        crop: &Crop,
        treatment: &Treatment,
        controls: &EffectiveControls,
        latest_date: Option<NaiveDate>,
    ) -> LocationResult {
        let location_id = treatment.location_id;
        if self.cancel.is_cancelled() {
            log::debug!("location {location_id}: skipped, run cancelled");
            return LocationResult::failed(location_id, EngineFailure::cancelled());
        }

        let started = Instant::now();
        let outcome = WorkArea::allocate(
            &self.config.work_root(),
            self.run_id,
            location_id,
            self.config.keep_work_areas,
        )
        .map_err(|e| EngineFailure::system(format!("cannot create work area: {e}")))
        .and_then(|area| {
            let request = EngineRequest {
                run_id: self.run_id,
                crop,
                treatment,
                controls,
                season_end: self.season_end(treatment, latest_date),
            };
            let context = EngineContext {
                work_dir: area.path(),
                cancel:   self.cancel,
                timeout:  self.config.timeout(),
            };
            panic::catch_unwind(AssertUnwindSafe(|| self.engine.simulate(&request, &context)))
                .unwrap_or_else(|payload| {
                    Err(EngineFailure::system(format!(
                        "engine panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                })
        });

        let elapsed = started.elapsed();
        match &outcome {
            Ok(output) => log::info!(
                "location {location_id}: {} record(s) in {elapsed:.2?}",
                output.records.len()
            ),
            Err(failure) => log::warn!("location {location_id}: failed after {elapsed:.2?}: {failure}"),
        }
        LocationResult { location_id, outcome }
    }

    fn season_end(&self, treatment: &Treatment, latest_date: Option<NaiveDate>) -> NaiveDate {
        let planting = treatment.planting_date;
        match latest_date {
            Some(latest) => latest.max(planting),
            None => planting
                .checked_add_days(Days::new(u64::from(self.config.season_days)))
                .unwrap_or(planting),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
