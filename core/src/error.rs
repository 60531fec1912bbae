use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned synchronously to the caller.
///
/// Everything here except `Serialization` and `Other` is a caller-input
/// defect detected before the engine is ever invoked.
#[derive(Error, Debug)]
pub enum GsError {
    #[error("Registry full: at most {max} treatments per run")]
    CapacityExceeded { max: usize },

    #[error("Invalid nitrogen application #{index}: {reason}")]
    InvalidNitrogen { index: usize, reason: String },

    #[error("Soil file {path} must hold exactly one profile, found {found}")]
    SoilProfileCount { path: String, found: usize },

    #[error("Cannot read soil file {path}: {reason}")]
    SoilUnreadable { path: String, reason: String },

    #[error("Invalid planting date '{input}'")]
    InvalidDate { input: String },

    #[error("Cultivar code must not be blank")]
    BlankCultivar,

    #[error("Invalid cultivar code '{code}': {reason}")]
    InvalidCultivar { code: String, reason: String },

    #[error("'{name}' is not a valid crop")]
    UnknownCrop { name: String },

    #[error("Unknown simulation control '{key}'")]
    UnknownControl { key: String },

    #[error("Simulation control {key} is given more than once")]
    DuplicateControl { key: String },

    #[error("Invalid value '{value}' for simulation control {key}")]
    InvalidControlValue { key: String, value: String },

    #[error("No treatments have been added")]
    NoTreatments,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GsError {
    /// True for caller-input defects, false for plumbing failures.
    pub fn is_validation(&self) -> bool {
        !matches!(self, GsError::Serialization(_) | GsError::Other(_))
    }
}

pub type GsResult<T> = Result<T, GsError>;

/// How a single location's execution failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The engine ran and reported an error (bad cultivar, non-convergence, ...).
    Engine,
    /// The engine could not be prepared or launched (IO, spawn, panic).
    System,
    /// The per-treatment timeout elapsed before the engine finished.
    TimedOut,
    /// The run was cancelled before or during this treatment.
    Cancelled,
}

/// Captured per-location failure descriptor. Never propagated out of `run`.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct EngineFailure {
    pub kind:    FailureKind,
    pub message: String,
}

impl EngineFailure {
    pub fn engine(message: impl Into<String>) -> Self {
        Self { kind: FailureKind::Engine, message: message.into() }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self { kind: FailureKind::System, message: message.into() }
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self { kind: FailureKind::TimedOut, message: message.into() }
    }

    pub fn cancelled() -> Self {
        Self { kind: FailureKind::Cancelled, message: "run cancelled".into() }
    }
}

impl From<std::io::Error> for EngineFailure {
    fn from(e: std::io::Error) -> Self {
        EngineFailure::system(e.to_string())
    }
}
