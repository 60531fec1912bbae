//! Treatment: one location's complete simulation configuration.
//!
//! RULE: A Treatment is only ever built by the registry, after validation.
//! Once stored it is never mutated.

use crate::{
    error::{GsError, GsResult},
    types::LocationId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine column limits. Values past these shift every later field in the row.
pub const MAX_DAYS_AFTER_PLANTING: u32 = 99_999;
pub const MAX_RATE_KG_HA: f64 = 999.9;
pub const MAX_CULTIVAR_LEN: usize = 6;

/// One urea application, `days_after_planting` days after sowing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NitrogenApplication {
    pub days_after_planting: u32,
    pub rate_kg_ha:          f64,
}

impl NitrogenApplication {
    /// Validate a raw `(days_after_planting, rate)` pair.
    /// `index` is the position in the caller's schedule, used in errors.
    pub fn checked(index: usize, days_after_planting: i64, rate_kg_ha: f64) -> GsResult<Self> {
        if days_after_planting < 0 {
            return Err(GsError::InvalidNitrogen {
                index,
                reason: format!("days after planting is negative ({days_after_planting})"),
            });
        }
        let days_after_planting = u32::try_from(days_after_planting)
            .ok()
            .filter(|d| *d <= MAX_DAYS_AFTER_PLANTING)
            .ok_or_else(|| GsError::InvalidNitrogen {
                index,
                reason: format!(
                    "days after planting {days_after_planting} exceeds {MAX_DAYS_AFTER_PLANTING}"
                ),
            })?;
        if !rate_kg_ha.is_finite() || rate_kg_ha <= 0.0 {
            return Err(GsError::InvalidNitrogen {
                index,
                reason: format!("rate must be a positive number, got {rate_kg_ha}"),
            });
        }
        // Written with one decimal, so compare what will actually be written.
        if (rate_kg_ha * 10.0).round() / 10.0 > MAX_RATE_KG_HA {
            return Err(GsError::InvalidNitrogen {
                index,
                reason: format!("rate {rate_kg_ha} kg/ha exceeds {MAX_RATE_KG_HA}"),
            });
        }
        Ok(Self { days_after_planting, rate_kg_ha })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Treatment {
    pub location_id:   LocationId,
    pub soil:          PathBuf,
    pub weather:       PathBuf,
    /// Ascending by days after planting.
    pub nitrogen:      Vec<NitrogenApplication>,
    pub planting_date: NaiveDate,
    pub cultivar:      String,
}

impl Treatment {
    pub fn soil_path(&self) -> &Path {
        &self.soil
    }

    pub fn weather_path(&self) -> &Path {
        &self.weather
    }

    /// Total nitrogen applied over the season, kg/ha.
    pub fn total_nitrogen(&self) -> f64 {
        self.nitrogen.iter().map(|n| n.rate_kg_ha).sum()
    }
}

/// Parse an ISO `YYYY-MM-DD` planting date.
pub fn parse_planting_date(input: &str) -> GsResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| GsError::InvalidDate { input: input.to_string() })
}

/// Build a planting date from its parts, rejecting impossible dates like Feb 30.
pub fn planting_date(year: i32, month: u32, day: u32) -> GsResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| GsError::InvalidDate {
        input: format!("{year:04}-{month:02}-{day:02}"),
    })
}
