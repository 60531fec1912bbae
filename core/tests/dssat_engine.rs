//! DSSAT adapter against a stand-in engine binary (a shell script).

#![cfg(unix)]

mod common;

use common::{date, init_logging, Fixtures};
use spatial_core::{
    config::{DssatConfig, RunConfig},
    engine::{CancelToken, OutputValue},
    error::FailureKind,
    run::{GsRun, RunOptions},
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── Test helpers ────────────────────────────────────────────────────────────

const SUMMARY_SCRIPT: &str = r#"#!/bin/sh
if [ ! -f "$2" ]; then echo "missing batch file $2"; exit 2; fi
if [ ! -f SOIL.SOL ]; then echo "missing soil"; exit 3; fi
echo ""
echo "RUN    TRT FLO MAT TOPWT HARWT  RAIN  TIRR   CET  PESW  TNUP  TNLF   TSON TSOC"
echo "           dap dap kg/ha kg/ha    mm    mm    mm    mm kg/ha kg/ha  kg/ha t/ha"
echo ""
echo "  1 MZ   1  62 124 12034  5410   512     0   398    87   143    21   4012   52"
"#;

const ERROR_SCRIPT: &str = r#"#!/bin/sh
echo "Error in weather file: no data for simulation period" > ERROR.OUT
exit 99
"#;

const HANG_SCRIPT: &str = "#!/bin/sh\nwhile true; do :; done\n";

struct EngineHome {
    fx:   Fixtures,
    home: PathBuf,
}

impl EngineHome {
    fn new(script: &str) -> Self {
        let fx = Fixtures::new();
        let home = fx.dir.path().join("dssat");
        std::fs::create_dir_all(home.join("Genotype")).unwrap();
        std::fs::create_dir_all(home.join("bin")).unwrap();
        std::fs::write(
            home.join("Genotype").join("MZCER048.CUL"),
            "*MAIZE CULTIVAR COEFFICIENTS\n\
             @VAR#  VRNAME.......... EXPNO   ECO#    P1    P2    P5    G2    G3 PHINT\n\
             !comment line\n\
             IB1072 2500-2600 GDD        . IB0001 240.0 0.500 810.0 860.0 8.500 38.90\n",
        )
        .unwrap();
        let binary = home.join("bin").join("dscsm048");
        std::fs::write(&binary, script).unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { fx, home }
    }

    fn run(&self, timeout: Option<Duration>) -> GsRun {
        let mut config = RunConfig::default().with_work_root(self.fx.work_root());
        config.keep_work_areas = true;
        if let Some(timeout) = timeout {
            config = config.with_timeout(timeout);
        }
        config.dssat = Some(DssatConfig::new(&self.home));
        GsRun::with_dssat("Maize", config).unwrap()
    }

    fn only_work_area(&self) -> PathBuf {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(self.fx.work_root())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(dirs.len(), 1, "expected one work area, got {dirs:?}");
        dirs.remove(0)
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn summary_rows_come_back_tagged_and_dated() {
    init_logging();
    let env = EngineHome::new(SUMMARY_SCRIPT);
    let mut run = env.run(None);
    run.add_treatment(&env.fx.soil, &env.fx.weather, &[(30, 50.0), (0, 40.0)], date(2021, 11, 15), "IB1072")
        .unwrap();

    let result = run.run(&RunOptions::new()).unwrap();

    assert!(result.is_complete(), "failures: {:?}", result.failures());
    assert_eq!(result.rows().len(), 1);
    let row = &result.rows()[0];
    assert_eq!(row.location_id, 1);
    assert_eq!(row.date, date(2022, 3, 19));
    assert_eq!(row.number("HARWT"), Some(5410.0));
    assert_eq!(row.get("CR"), Some(&OutputValue::Text("MZ".into())));
    assert_eq!(result.columns().len(), 15);
}

#[test]
fn work_area_holds_every_engine_input() {
    let env = EngineHome::new(SUMMARY_SCRIPT);
    let mut run = env.run(None);
    run.add_treatment(&env.fx.soil, &env.fx.weather, &[(30, 50.0), (0, 40.0)], date(2021, 11, 15), "IB1072")
        .unwrap();

    run.run(&RunOptions::new().with_control("NITRO", "N")).unwrap();

    let dir = env.only_work_area();
    let soil = read(&dir.join("SOIL.SOL"));
    assert!(soil.starts_with("*SOILS"));
    assert!(soil.contains("*IB00000001"));
    assert!(dir.join("SEAA2101.WTH").is_file());
    assert!(dir.join("SEAA2201.WTH").is_file());

    let experiment = read(&dir.join("EXPEFILE.MZX"));
    let day0 = experiment.find(" 1 0     FE005").unwrap();
    let day30 = experiment.find(" 1 30    FE005").unwrap();
    assert!(day0 < day30);
    assert!(experiment.contains(" 1 OP              Y     N"));
    assert!(experiment.contains("SEAA2101"));

    let batch = read(&dir.join("DSSBatch.v48"));
    assert!(batch.starts_with("$BATCH(SPATIAL)"));
    assert!(batch.contains("EXPEFILE.MZX"));

    let control = read(&dir.join("DSSATPRO.L48"));
    assert!(control.contains("MMZ"));
    assert!(control.contains("MZCER048"));
}

#[test]
fn cultivar_missing_from_catalogue_is_an_engine_failure() {
    let env = EngineHome::new(SUMMARY_SCRIPT);
    let mut run = env.run(None);
    run.add_treatment(&env.fx.soil, &env.fx.weather, &[], date(2021, 11, 15), "IB1072").unwrap();
    run.add_treatment(&env.fx.soil, &env.fx.weather, &[], date(2021, 11, 15), "ZZ0000").unwrap();

    let result = run.run(&RunOptions::new()).unwrap();

    assert_eq!(result.location_ids(), vec![1]);
    let failure = result.failure(2).unwrap();
    assert_eq!(failure.kind, FailureKind::Engine);
    assert!(failure.message.contains("ZZ0000"), "{}", failure.message);
}

#[test]
fn error_log_is_reported_as_engine_failure() {
    let env = EngineHome::new(ERROR_SCRIPT);
    let mut run = env.run(None);
    run.add_treatment(&env.fx.soil, &env.fx.weather, &[], date(2021, 11, 15), "IB1072").unwrap();

    let result = run.run(&RunOptions::new()).unwrap();

    let failure = result.failure(1).unwrap();
    assert_eq!(failure.kind, FailureKind::Engine);
    assert!(failure.message.contains("no data for simulation period"), "{}", failure.message);
}

#[test]
fn missing_binary_is_a_system_failure() {
    let env = EngineHome::new(SUMMARY_SCRIPT);
    let mut config = RunConfig::default().with_work_root(env.fx.work_root());
    config.dssat = Some(DssatConfig::new(&env.home).with_binary(env.home.join("bin").join("absent")));
    let mut run = GsRun::with_dssat("Maize", config).unwrap();
    run.add_treatment(&env.fx.soil, &env.fx.weather, &[], date(2021, 11, 15), "IB1072").unwrap();

    let result = run.run(&RunOptions::new()).unwrap();

    assert_eq!(result.failure(1).unwrap().kind, FailureKind::System);
}

#[test]
fn missing_weather_is_an_engine_failure() {
    let env = EngineHome::new(SUMMARY_SCRIPT);
    let mut run = env.run(None);
    run.add_treatment(&env.fx.soil, env.fx.dir.path().join("gone.WTH"), &[], date(2021, 11, 15), "IB1072")
        .unwrap();

    let result = run.run(&RunOptions::new()).unwrap();

    let failure = result.failure(1).unwrap();
    assert_eq!(failure.kind, FailureKind::Engine);
    assert!(failure.message.contains("gone.WTH"));
}

#[test]
fn hung_engine_is_killed_at_timeout() {
    let env = EngineHome::new(HANG_SCRIPT);
    let mut run = env.run(Some(Duration::from_secs(1)));
    run.add_treatment(&env.fx.soil, &env.fx.weather, &[], date(2021, 11, 15), "IB1072").unwrap();

    let result = run.run(&RunOptions::new()).unwrap();

    assert_eq!(result.failure(1).unwrap().kind, FailureKind::TimedOut);
}

#[test]
fn cancellation_kills_a_running_engine() {
    let env = EngineHome::new(HANG_SCRIPT);
    let mut run = env.run(None);
    run.add_treatment(&env.fx.soil, &env.fx.weather, &[], date(2021, 11, 15), "IB1072").unwrap();

    let cancel = CancelToken::new();
    let canceller = {
        let cancel = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            cancel.cancel();
        })
    };
    let result = run.run(&RunOptions::new().with_cancel(cancel)).unwrap();
    canceller.join().unwrap();

    assert!(result.was_cancelled());
}
