//! spatial-core: run one crop simulation per location and merge the results.
//!
//! ```no_run
//! use spatial_core::{config::{DssatConfig, RunConfig}, run::{GsRun, RunOptions}, treatment};
//!
//! # fn main() -> spatial_core::error::GsResult<()> {
//! let config = RunConfig {
//!     dssat: Some(DssatConfig::new("/opt/dssat")),
//!     ..RunConfig::default()
//! };
//! let mut run = GsRun::with_dssat("Maize", config)?;
//! run.add_treatment(
//!     "soils/ZW00000001.SOL",
//!     "weather/harare.WTH",
//!     &[(0, 40.0), (30, 50.0)],
//!     treatment::planting_date(2021, 11, 15)?,
//!     "IB1072",
//! )?;
//! let result = run.run(&RunOptions::new().with_control("WATER", "N"))?;
//! for (location, failure) in result.failures() {
//!     eprintln!("location {location} failed: {failure}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod controls;
pub mod crop;
pub mod dssat;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod run;
pub mod treatment;
pub mod types;
pub mod workspace;

pub use aggregate::{AggregatedResult, LocationResult, ResultRow};
pub use error::{EngineFailure, FailureKind, GsError, GsResult};
pub use run::{GsRun, RunOptions};
