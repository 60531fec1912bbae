//! Treatment registry: validates and stores treatments.
//!
//! RULES:
//!   - Append only. No update, no remove.
//!   - Location ids are assigned 1, 2, 3, ... in registration order.
//!   - A rejected registration leaves the registry untouched.
//!   - Every stored value fits its fixed-width column in the engine input.

use crate::{
    dssat::soil,
    error::{GsError, GsResult},
    treatment::{NitrogenApplication, Treatment, MAX_CULTIVAR_LEN},
    types::{LocationId, MAX_TREATMENTS},
};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct TreatmentRegistry {
    treatments: Vec<Treatment>,
}

impl TreatmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a treatment. Returns its location id.
    ///
    /// The cultivar is only checked for blankness here; whether the engine
    /// knows it is decided at execution time.
    pub fn register(
        &mut self,
        soil: impl AsRef<Path>,
        weather: impl AsRef<Path>,
        nitrogen: &[(i64, f64)],
        planting_date: NaiveDate,
        cultivar: &str,
    ) -> GsResult<LocationId> {
        if self.treatments.len() >= MAX_TREATMENTS {
            return Err(GsError::CapacityExceeded { max: MAX_TREATMENTS });
        }

        let nitrogen = normalize_schedule(nitrogen)?;

        let soil = soil.as_ref();
        let profiles = soil::count_profiles_in_file(soil)?;
        if profiles != 1 {
            return Err(GsError::SoilProfileCount {
                path:  soil.display().to_string(),
                found: profiles,
            });
        }

        let cultivar = cultivar.trim();
        if cultivar.is_empty() {
            return Err(GsError::BlankCultivar);
        }
        if cultivar.len() > MAX_CULTIVAR_LEN || cultivar.contains(char::is_whitespace) {
            return Err(GsError::InvalidCultivar {
                code:   cultivar.to_string(),
                reason: format!("expected at most {MAX_CULTIVAR_LEN} characters with no spaces"),
            });
        }

        let location_id = self.treatments.len() as LocationId + 1;
        self.treatments.push(Treatment {
            location_id,
            soil: PathBuf::from(soil),
            weather: weather.as_ref().to_path_buf(),
            nitrogen,
            planting_date,
            cultivar: cultivar.to_string(),
        });
        log::debug!(
            "registered location {location_id}: soil={} cultivar={cultivar}",
            soil.display()
        );
        Ok(location_id)
    }

    pub fn treatments(&self) -> &[Treatment] {
        &self.treatments
    }

    pub fn get(&self, location_id: LocationId) -> Option<&Treatment> {
        self.treatments.iter().find(|t| t.location_id == location_id)
    }

    pub fn len(&self) -> usize {
        self.treatments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.treatments.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.treatments.len() >= MAX_TREATMENTS
    }
}

/// Validate every application, then sort ascending by days after planting.
/// The sort is stable, so same-day applications keep the caller's order.
pub fn normalize_schedule(raw: &[(i64, f64)]) -> GsResult<Vec<NitrogenApplication>> {
    let mut schedule = raw
        .iter()
        .enumerate()
        .map(|(i, &(dap, rate))| NitrogenApplication::checked(i, dap, rate))
        .collect::<GsResult<Vec<_>>>()?;
    schedule.sort_by_key(|n| n.days_after_planting);
    Ok(schedule)
}
