//! Shared primitive types used across the entire run.

/// A location identifier. Assigned 1..=MAX_TREATMENTS in registration order.
pub type LocationId = u32;

/// The canonical run identifier.
pub type RunId = String;

/// Hard cap on treatments per run. The engine's treatment column is two digits wide.
pub const MAX_TREATMENTS: usize = 99;
