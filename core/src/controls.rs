//! Simulation control resolution.
//!
//! RULES:
//!   - Defaults have every stress process active (water and nitrogen ON).
//!   - An override replaces the default for its key; other keys keep defaults.
//!   - Unknown keys are rejected before the engine is ever invoked.
//!   - Two keys naming the same option (e.g. "WATER" and "water") are rejected.
//!   - resolve() is pure. It is rebuilt on every run and never stored.

use crate::error::{GsError, GsResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Caller-supplied overrides, keyed by option name (e.g. `"WATER"`).
pub type SimControls = BTreeMap<String, String>;

/// Every option the engine's control section accepts.
/// Declaration order is the order of the defaults table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimOption {
    Water,
    Nitro,
    Symbi,
    Phosp,
    Potas,
    Co2,
    Light,
    Evapo,
    Infil,
    Photo,
    Mesom,
    Mesev,
    Mesol,
}

impl SimOption {
    pub const ALL: [SimOption; 13] = [
        SimOption::Water,
        SimOption::Nitro,
        SimOption::Symbi,
        SimOption::Phosp,
        SimOption::Potas,
        SimOption::Co2,
        SimOption::Light,
        SimOption::Evapo,
        SimOption::Infil,
        SimOption::Photo,
        SimOption::Mesom,
        SimOption::Mesev,
        SimOption::Mesol,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Water => "WATER",
            Self::Nitro => "NITRO",
            Self::Symbi => "SYMBI",
            Self::Phosp => "PHOSP",
            Self::Potas => "POTAS",
            Self::Co2   => "CO2",
            Self::Light => "LIGHT",
            Self::Evapo => "EVAPO",
            Self::Infil => "INFIL",
            Self::Photo => "PHOTO",
            Self::Mesom => "MESOM",
            Self::Mesev => "MESEV",
            Self::Mesol => "MESOL",
        }
    }

    pub fn default_value(&self) -> char {
        match self {
            Self::Water => 'Y',
            Self::Nitro => 'Y',
            Self::Symbi => 'N',
            Self::Phosp => 'N',
            Self::Potas => 'N',
            Self::Co2   => 'D',
            Self::Light => 'E',
            Self::Evapo => 'R',
            Self::Infil => 'S',
            Self::Photo => 'C',
            Self::Mesom => 'P',
            Self::Mesev => 'R',
            Self::Mesol => '2',
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.key() == key)
    }

    /// Process switches take Y/N only.
    fn is_switch(&self) -> bool {
        matches!(
            self,
            Self::Water | Self::Nitro | Self::Symbi | Self::Phosp | Self::Potas
        )
    }

    /// Each value lands in a one-character engine column.
    fn accepts(&self, value: char) -> bool {
        if self.is_switch() {
            matches!(value, 'Y' | 'N')
        } else {
            value.is_ascii_alphanumeric()
        }
    }
}

impl fmt::Display for SimOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Defaults overlaid with one run's overrides. Holds a value for every option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectiveControls {
    values: BTreeMap<SimOption, char>,
}

impl Default for EffectiveControls {
    fn default() -> Self {
        Self {
            values: SimOption::ALL
                .into_iter()
                .map(|o| (o, o.default_value()))
                .collect(),
        }
    }
}

impl EffectiveControls {
    pub fn get(&self, option: SimOption) -> char {
        self.values
            .get(&option)
            .copied()
            .unwrap_or_else(|| option.default_value())
    }

    /// Values in defaults-table order.
    pub fn ordered(&self) -> impl Iterator<Item = (SimOption, char)> + '_ {
        SimOption::ALL.into_iter().map(|o| (o, self.get(o)))
    }

    /// Options whose value differs from the default.
    pub fn overridden(&self) -> Vec<SimOption> {
        self.ordered()
            .filter(|(o, v)| *v != o.default_value())
            .map(|(o, _)| o)
            .collect()
    }

    pub fn water_stress(&self) -> bool {
        self.get(SimOption::Water) == 'Y'
    }

    pub fn nitrogen_stress(&self) -> bool {
        self.get(SimOption::Nitro) == 'Y'
    }
}

/// Overlay `overrides` onto the defaults.
///
/// Keys and values are trimmed and upper-cased before matching, so
/// `{"water": "n"}` is accepted. Anything else unrecognised fails.
pub fn resolve(overrides: &SimControls) -> GsResult<EffectiveControls> {
    let mut controls = EffectiveControls::default();
    let mut seen = BTreeSet::new();
    for (raw_key, raw_value) in overrides {
        let key = raw_key.trim().to_ascii_uppercase();
        let option = SimOption::from_key(&key)
            .ok_or_else(|| GsError::UnknownControl { key: raw_key.clone() })?;
        if !seen.insert(option) {
            return Err(GsError::DuplicateControl { key: option.key().to_string() });
        }

        let value = raw_value.trim().to_ascii_uppercase();
        let mut chars = value.chars();
        let c = match (chars.next(), chars.next()) {
            (Some(c), None) if option.accepts(c) => c,
            _ => {
                return Err(GsError::InvalidControlValue {
                    key:   option.key().to_string(),
                    value: raw_value.clone(),
                })
            }
        };
        controls.values.insert(option, c);
    }
    Ok(controls)
}
