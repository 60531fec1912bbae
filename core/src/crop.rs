//! Crop catalogue: the crops a run may be built for.
//!
//! Each entry carries the engine's two-letter crop code and the crop
//! module that simulates it. Entries are append-only.

use crate::error::{GsError, GsResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct Crop {
    pub name:   &'static str,
    pub code:   &'static str,
    pub module: &'static str,
}

const CATALOGUE: &[Crop] = &[
    Crop { name: "Maize",     code: "MZ", module: "MZCER" },
    Crop { name: "Sorghum",   code: "SG", module: "SGCER" },
    Crop { name: "Millet",    code: "ML", module: "MLCER" },
    Crop { name: "Rice",      code: "RI", module: "RICER" },
    Crop { name: "Wheat",     code: "WH", module: "CSCER" },
    Crop { name: "Barley",    code: "BA", module: "CSCER" },
    Crop { name: "Soybean",   code: "SB", module: "CRGRO" },
    Crop { name: "Peanut",    code: "PN", module: "CRGRO" },
    Crop { name: "Drybean",   code: "BN", module: "CRGRO" },
    Crop { name: "Tomato",    code: "TM", module: "CRGRO" },
    Crop { name: "Potato",    code: "PT", module: "PTSUB" },
    Crop { name: "Cassava",   code: "CS", module: "CSYCA" },
    Crop { name: "Sunflower", code: "SU", module: "SUOIL" },
    Crop { name: "Sugarcane", code: "SC", module: "SCCAN" },
];

impl Crop {
    /// Look up a crop by name, ignoring case and surrounding whitespace.
    pub fn lookup(name: &str) -> GsResult<Crop> {
        let wanted = name.trim();
        CATALOGUE
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| GsError::UnknownCrop { name: name.to_string() })
    }

    /// Cultivar catalogue file name, e.g. `MZCER048.CUL` or `SBGRO048.CUL`.
    pub fn cultivar_file(&self, version: &str) -> String {
        format!("{}{}{}.CUL", self.code, &self.module[2..], version)
    }

    /// Wheat and barley run the shared cereal module, which the engine
    /// resolves relative to the run directory rather than its home.
    pub fn uses_shared_cereal_module(&self) -> bool {
        matches!(self.code, "WH" | "BA")
    }
}
