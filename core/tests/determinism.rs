//! Same treatments, same controls: the serialized result must be identical
//! no matter how many workers ran it or how many times it ran.

mod common;

use common::{date, Fixtures, ScriptedEngine, UNKNOWN_CULTIVAR};
use spatial_core::{
    config::RunConfig,
    run::{GsRun, RunOptions},
};
use std::sync::Arc;
use std::time::Duration;

fn result_json(fx: &Fixtures, workers: usize) -> String {
    // Later ids finish first so completion order differs from registration order.
    let mut engine = ScriptedEngine::new();
    for id in 1..=12 {
        engine = engine.with_delay(id, Duration::from_millis(u64::from(13 - id) * 3));
    }
    let mut run = GsRun::new("Maize", Arc::new(engine))
        .expect("maize is catalogued")
        .with_config(RunConfig::default().with_workers(workers).with_work_root(fx.work_root()));

    for i in 0..12i64 {
        let cultivar = if i == 5 { UNKNOWN_CULTIVAR } else { "IB1072" };
        run.add_treatment(
            &fx.soil,
            &fx.weather,
            &[(30 - i, 20.0 + i as f64), (i, 10.0)],
            date(2021, 11, 1 + i as u32),
            cultivar,
        )
        .expect("valid treatment");
    }

    run.run(&RunOptions::new().with_control("nitro", "n"))
        .expect("run")
        .to_json()
        .expect("serialize")
}

#[test]
fn repeated_runs_serialize_identically() {
    let fx = Fixtures::new();
    let reference = result_json(&fx, 1);

    for workers in [1, 3, 12] {
        let again = result_json(&fx, workers);
        assert_eq!(
            reference, again,
            "result diverged with {workers} workers"
        );
    }
}
