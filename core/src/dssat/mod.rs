//! The DSSAT engine adapter.
//!
//! EXECUTION STEPS (per treatment, all inside its own work area):
//!   1. Check the cultivar against the Genotype catalogue
//!   2. Write SOIL.SOL with the single profile re-keyed
//!   3. Stage the weather file once per season year
//!   4. Write the experiment, batch and control files
//!   5. Launch the engine in spatial mode and wait
//!   6. Parse the stdout summary table
//!
//! RULE: nothing here writes outside the work area it is handed.

pub mod cultivar;
pub mod files;
pub mod home;
pub mod process;
pub mod soil;
pub mod summary;

use crate::{
    config::DssatConfig,
    engine::{EngineContext, EngineOutput, EngineRequest, SimulationEngine},
    error::{EngineFailure, GsResult},
};
use chrono::Datelike;
use std::path::{Path, PathBuf};

/// Engine error log. Present and non-empty means the run failed.
const ERROR_FILE: &str = "ERROR.OUT";

pub struct DssatEngine {
    config: DssatConfig,
    /// Home the engine is pointed at: the configured one, or its staged short copy.
    home: PathBuf,
}

impl DssatEngine {
    pub fn new(config: DssatConfig) -> GsResult<Self> {
        let home = if config.stage_short_home {
            home::stage_short_home(&config, &std::env::temp_dir())
                .map_err(|e| anyhow::anyhow!("cannot stage engine home: {e}"))?
        } else {
            config.home.clone()
        };
        let binary = config.binary_path();
        if !binary.exists() {
            log::warn!("engine binary {} does not exist yet", binary.display());
        }
        Ok(Self { config, home })
    }

    pub fn config(&self) -> &DssatConfig {
        &self.config
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    fn check_cultivar(&self, request: &EngineRequest<'_>) -> Result<(), EngineFailure> {
        let catalogue = cultivar::catalogue_path(&self.home, &self.config, request.crop);
        let cultivar = &request.treatment.cultivar;
        match cultivar::is_known(&catalogue, cultivar) {
            Some(true) => Ok(()),
            Some(false) => Err(EngineFailure::engine(format!(
                "cultivar {cultivar} not found in {}",
                catalogue.display()
            ))),
            None => {
                log::debug!(
                    "cultivar catalogue {} unreadable, leaving the check to the engine",
                    catalogue.display()
                );
                Ok(())
            }
        }
    }

    fn prepare(&self, request: &EngineRequest<'_>, work_dir: &Path) -> Result<(), EngineFailure> {
        let treatment = request.treatment;

        let soil = treatment.soil_path();
        let profile = std::fs::read_to_string(soil)
            .map_err(|e| EngineFailure::engine(format!("cannot read soil {}: {e}", soil.display())))?;
        std::fs::write(work_dir.join("SOIL.SOL"), soil::render_soil_file(&profile))?;

        let weather = treatment.weather_path();
        if !weather.is_file() {
            return Err(EngineFailure::engine(format!(
                "weather file {} does not exist",
                weather.display()
            )));
        }
        for year in treatment.planting_date.year()..=request.season_end.year() {
            std::fs::copy(weather, work_dir.join(files::weather_file_name(year)))?;
        }

        let experiment = work_dir.join(files::experiment_file_name(request.crop));
        std::fs::write(
            &experiment,
            files::render_experiment(request.crop, treatment, request.controls),
        )?;
        std::fs::write(
            work_dir.join(self.config.batch_file_name()),
            files::render_batch(&self.config, work_dir, request.crop, &experiment),
        )?;
        std::fs::write(
            work_dir.join(self.config.control_file_name()),
            files::render_control(&self.config, &self.home, work_dir, request.crop),
        )?;
        Ok(())
    }
}

impl SimulationEngine for DssatEngine {
    fn name(&self) -> &'static str {
        "dssat"
    }

    fn simulate(
        &self,
        request: &EngineRequest<'_>,
        context: &EngineContext<'_>,
    ) -> Result<EngineOutput, EngineFailure> {
        self.check_cultivar(request)?;
        self.prepare(request, context.work_dir)?;

        let run = process::run_engine(
            &self.config,
            &self.home,
            context.work_dir,
            context.cancel,
            context.timeout,
        )?;

        let error_log = std::fs::read_to_string(context.work_dir.join(ERROR_FILE)).unwrap_or_default();
        if !run.status.success() || !error_log.trim().is_empty() {
            let detail = if error_log.trim().is_empty() {
                summary::tail(&format!("{}\n{}", run.stdout, run.stderr), 5)
            } else {
                summary::tail(&error_log, 10)
            };
            return Err(EngineFailure::engine(format!(
                "engine exited with {}: {detail}",
                run.status
            )));
        }

        let output = summary::parse_summary(&run.stdout, request.treatment.planting_date);
        if output.is_empty() {
            return Err(EngineFailure::engine(format!(
                "engine produced no summary rows: {}",
                summary::tail(&run.stdout, 5)
            )));
        }
        Ok(output)
    }
}
