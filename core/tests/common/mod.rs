//! Shared fixtures: soil/weather files on disk and a scripted engine.

#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use spatial_core::{
    controls::EffectiveControls,
    engine::{EngineContext, EngineOutput, EngineRequest, OutputRecord, OutputValue, SimulationEngine},
    error::EngineFailure,
    treatment::NitrogenApplication,
    types::LocationId,
};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

pub const SINGLE_PROFILE: &str = "*ZW00000042  ISRIC       SCL     150 ISRIC soil grid\n\
@SITE        COUNTRY          LAT     LONG SCS FAMILY\n \
-99              ZW      -17.750   31.050 -99\n";

/// Cultivar the scripted engine reports as unknown.
pub const UNKNOWN_CULTIVAR: &str = "XX9999";
/// Cultivar that makes the scripted engine panic.
pub const PANIC_CULTIVAR: &str = "PANIC1";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Fixtures {
    pub dir:     TempDir,
    pub soil:    PathBuf,
    pub weather: PathBuf,
}

impl Fixtures {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("fixture dir");
        let soil = dir.path().join("single.SOL");
        std::fs::write(&soil, SINGLE_PROFILE).expect("write soil");
        let weather = dir.path().join("site.WTH");
        std::fs::write(&weather, "*WEATHER DATA : test\n").expect("write weather");
        Self { dir, soil, weather }
    }

    pub fn multi_profile_soil(&self) -> PathBuf {
        let path = self.dir.path().join("double.SOL");
        std::fs::write(&path, format!("*SOILS: two\n\n{SINGLE_PROFILE}\n{SINGLE_PROFILE}"))
            .expect("write soil");
        path
    }

    pub fn work_root(&self) -> PathBuf {
        self.dir.path().join("work")
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// What the scripted engine saw for one invocation.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub location_id: LocationId,
    pub nitrogen:    Vec<NitrogenApplication>,
    pub controls:    EffectiveControls,
    pub work_dir:    PathBuf,
    pub season_end:  NaiveDate,
}

/// Deterministic stand-in for the crop model.
///
/// Emits three records per location (planting, +30, +60 days) with:
///   - `TOTN`:  total nitrogen applied (independent of water stress)
///   - `HARWT`: yield, reduced by 25% when water stress is simulated
///   - `LOC`:   the location id it was invoked for
#[derive(Default)]
pub struct ScriptedEngine {
    pub calls:   AtomicUsize,
    pub seen:    Mutex<Vec<SeenRequest>>,
    /// Per-location sleep, to force completion order.
    pub delays:  HashMap<LocationId, Duration>,
    in_flight:   AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, location_id: LocationId, delay: Duration) -> Self {
        self.delays.insert(location_id, delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().expect("seen lock").clone()
    }
}

impl SimulationEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn simulate(
        &self,
        request: &EngineRequest<'_>,
        context: &EngineContext<'_>,
    ) -> Result<EngineOutput, EngineFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.simulate_inner(request, context);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl ScriptedEngine {
    fn simulate_inner(
        &self,
        request: &EngineRequest<'_>,
        context: &EngineContext<'_>,
    ) -> Result<EngineOutput, EngineFailure> {
        let t = request.treatment;
        self.seen.lock().expect("seen lock").push(SeenRequest {
            location_id: t.location_id,
            nitrogen:    t.nitrogen.clone(),
            controls:    request.controls.clone(),
            work_dir:    context.work_dir.to_path_buf(),
            season_end:  request.season_end,
        });

        // The engine writes fixed file names; a shared work area would show up here.
        let marker = context.work_dir.join("EXPEFILE.MZX");
        if marker.exists() {
            return Err(EngineFailure::system("work area already in use"));
        }
        std::fs::write(&marker, t.location_id.to_string())?;

        if let Some(delay) = self.delays.get(&t.location_id) {
            thread::sleep(*delay);
        }
        if context.cancel.is_cancelled() {
            return Err(EngineFailure::cancelled());
        }
        if t.cultivar == UNKNOWN_CULTIVAR {
            return Err(EngineFailure::engine(format!("cultivar {} not in catalogue", t.cultivar)));
        }
        if t.cultivar == PANIC_CULTIVAR {
            panic!("scripted engine blew up");
        }

        let total_n = t.total_nitrogen();
        let water_factor = if request.controls.water_stress() { 0.75 } else { 1.0 };
        let mut output = EngineOutput::new(vec!["LOC".into(), "TOTN".into(), "HARWT".into()]);
        for (i, offset) in [0u64, 30, 60].into_iter().enumerate() {
            let mut values = BTreeMap::new();
            values.insert("LOC".to_string(), OutputValue::Number(f64::from(t.location_id)));
            values.insert("TOTN".to_string(), OutputValue::Number(total_n));
            let harwt = (1000.0 + 10.0 * total_n) * (i as f64 + 1.0) * water_factor;
            values.insert("HARWT".to_string(), OutputValue::Number(harwt));
            output.push(OutputRecord {
                date: t.planting_date + Days::new(offset),
                values,
            });
        }
        Ok(output)
    }
}

pub fn soil_in(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, SINGLE_PROFILE).expect("write soil");
    path
}
