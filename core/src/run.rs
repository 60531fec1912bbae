//! GsRun: the public three-step workflow.
//!
//!   1. GsRun::new(crop, engine)
//!   2. add_treatment(...) once per location (at most 99)
//!   3. run(&options) → AggregatedResult
//!
//! A GsRun holds no state beyond its crop and registry. run() may be
//! called repeatedly; each call resolves its own controls, work areas
//! and cancellation token.

use crate::{
    aggregate::{aggregate, AggregatedResult},
    config::RunConfig,
    controls::{self, SimControls},
    crop::Crop,
    dssat::DssatEngine,
    engine::{CancelToken, SimulationEngine},
    error::{GsError, GsResult},
    orchestrator::Orchestrator,
    registry::TreatmentRegistry,
    treatment::Treatment,
    types::RunId,
};
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;

/// Per-call options for [`GsRun::run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub sim_controls: SimControls,
    /// Last date the weather must cover, for every treatment.
    pub latest_date:  Option<NaiveDate>,
    /// Cancels this call's in-flight and pending treatments.
    /// None gives the call a private token nobody else can trip.
    pub cancel:       Option<CancelToken>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.sim_controls.insert(key.into(), value.into());
        self
    }

    pub fn with_latest_date(mut self, latest: NaiveDate) -> Self {
        self.latest_date = Some(latest);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

pub struct GsRun {
    crop:     Crop,
    registry: TreatmentRegistry,
    config:   RunConfig,
    engine:   Arc<dyn SimulationEngine>,
}

impl GsRun {
    /// Create an empty run for `crop_name` (case-insensitive, e.g. "maize").
    pub fn new(crop_name: &str, engine: Arc<dyn SimulationEngine>) -> GsResult<Self> {
        let crop = Crop::lookup(crop_name)?;
        Ok(Self {
            crop,
            registry: TreatmentRegistry::new(),
            config: RunConfig::default(),
            engine,
        })
    }

    /// Build a run backed by the DSSAT engine described in `config.dssat`.
    pub fn with_dssat(crop_name: &str, config: RunConfig) -> GsResult<Self> {
        config.validate()?;
        let dssat = config
            .dssat
            .clone()
            .ok_or_else(|| anyhow::anyhow!("run config has no dssat section"))?;
        let engine = DssatEngine::new(dssat)?;
        Ok(Self::new(crop_name, Arc::new(engine))?.with_config(config))
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Register one location. Fails without side effects on invalid input.
    pub fn add_treatment(
        &mut self,
        soil: impl AsRef<Path>,
        weather: impl AsRef<Path>,
        nitrogen: &[(i64, f64)],
        planting_date: NaiveDate,
        cultivar: &str,
    ) -> GsResult<()> {
        self.registry
            .register(soil, weather, nitrogen, planting_date, cultivar)
            .map(|_| ())
    }

    pub fn crop(&self) -> &Crop {
        &self.crop
    }

    pub fn crop_name(&self) -> &str {
        self.crop.name
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn treatments(&self) -> &[Treatment] {
        self.registry.treatments()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Execute every registered treatment and aggregate the results.
    ///
    /// Only validation problems are returned as errors. Engine failures
    /// are listed in [`AggregatedResult::failures`].
    pub fn run(&self, options: &RunOptions) -> GsResult<AggregatedResult> {
        if self.registry.is_empty() {
            return Err(GsError::NoTreatments);
        }
        let controls = controls::resolve(&options.sim_controls)?;

        let run_id: RunId = uuid::Uuid::new_v4().to_string();
        log::info!(
            "run {run_id}: {} x {} treatment(s), overridden controls {:?}",
            self.crop.name,
            self.registry.len(),
            controls.overridden()
        );

        let cancel = options.cancel.clone().unwrap_or_default();
        let orchestrator = Orchestrator::new(self.engine.as_ref(), &self.config, &cancel, &run_id);
        let results = orchestrator.execute_all(
            &self.crop,
            self.registry.treatments(),
            &controls,
            options.latest_date,
        );
        let aggregated = aggregate(results);

        log::info!(
            "run {run_id}: {} succeeded, {} failed, {} row(s)",
            aggregated.success_count(),
            aggregated.failure_count(),
            aggregated.rows().len()
        );
        Ok(aggregated)
    }
}
