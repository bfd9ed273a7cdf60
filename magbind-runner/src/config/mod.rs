//! Run configuration
//!
//! A run config names the protocol and carries its grids and overrides.
//! Operators edit TOML; `compile` stores the validated config as postcard
//! so a run can be replayed without the TOML parser.

pub mod loader;

use magbind_core::config::{CycleSettings, GridConfig, Instruments};
use magbind_core::grid::FillRule;
use magbind_protocols::handling::dilution::DilutionVolumes;
use magbind_protocols::Protocol;
use serde::{Deserialize, Serialize};

pub use loader::{compile, decode, encode, load};

/// Current config format version
pub const CONFIG_VERSION: u8 = 1;

fn default_version() -> u8 {
    CONFIG_VERSION
}

/// Everything needed to run one protocol
///
/// Volumes in `settings`, `instruments` and `dilution` are in hundredths
/// of a microliter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_version")]
    pub version: u8,
    pub protocol: Protocol,
    /// Selection table; required by the purification protocols and pooling
    #[serde(default)]
    pub grid: Option<String>,
    /// Overrides the protocol's fill rule
    #[serde(default)]
    pub fill: Option<FillRule>,
    /// Normalization water volumes
    #[serde(default)]
    pub water_grid: Option<String>,
    /// Normalization DNA volumes
    #[serde(default)]
    pub dna_grid: Option<String>,
    /// Overrides the protocol's instruments
    #[serde(default)]
    pub instruments: Option<Instruments>,
    /// Overrides the protocol's cycle settings
    #[serde(default)]
    pub settings: Option<CycleSettings>,
    #[serde(default)]
    pub dilution: Option<DilutionVolumes>,
}

impl RunConfig {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            version: CONFIG_VERSION,
            protocol,
            grid: None,
            fill: None,
            water_grid: None,
            dna_grid: None,
            instruments: None,
            settings: None,
            dilution: None,
        }
    }

    pub fn instruments(&self) -> Instruments {
        self.instruments.unwrap_or_else(|| self.protocol.instruments())
    }

    pub fn settings(&self) -> CycleSettings {
        self.settings.unwrap_or_else(|| self.protocol.settings())
    }

    pub fn fill(&self) -> FillRule {
        self.fill.unwrap_or_else(|| self.protocol.fill_rule())
    }

    /// Selection grid with the effective fill rule
    pub fn selection_grid(&self) -> Option<GridConfig<'_>> {
        self.grid.as_deref().map(|table| GridConfig {
            table,
            fill: self.fill(),
        })
    }
}
