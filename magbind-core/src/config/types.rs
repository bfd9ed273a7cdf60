//! Configuration type definitions
//!
//! These types describe the mounted instruments and the tunable parameters
//! of the purification cycle. Defaults reproduce the bench protocols.

use core::time::Duration;

use crate::plate::Volume;
use crate::traits::{BlowOut, Mount};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One mounted pipette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstrumentSpec {
    /// Largest volume a single tip holds
    pub max_volume: Volume,
    /// Channel count (1 for single, 8 for multi)
    pub channels: u8,
}

impl InstrumentSpec {
    /// 300 µL single-channel pipette
    pub const fn p300_single() -> Self {
        Self {
            max_volume: Volume::from_ul(300),
            channels: 1,
        }
    }

    /// 300 µL eight-channel pipette
    pub const fn p300_multi() -> Self {
        Self {
            max_volume: Volume::from_ul(300),
            channels: 8,
        }
    }

    /// 20 µL single-channel pipette
    pub const fn p20_single() -> Self {
        Self {
            max_volume: Volume::from_ul(20),
            channels: 1,
        }
    }
}

/// Instrument set (determined from config)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instruments {
    /// Single-channel mount
    pub single: Option<InstrumentSpec>,
    /// Multi-channel mount
    pub multi: Option<InstrumentSpec>,
}

impl Default for Instruments {
    fn default() -> Self {
        Self {
            single: Some(InstrumentSpec::p300_single()),
            multi: Some(InstrumentSpec::p300_multi()),
        }
    }
}

impl Instruments {
    /// Only a single-channel pipette
    pub const fn single_only() -> Self {
        Self::single(InstrumentSpec::p300_single())
    }

    /// One single-channel instrument, no multi-channel
    pub const fn single(spec: InstrumentSpec) -> Self {
        Self {
            single: Some(spec),
            multi: None,
        }
    }

    /// Spec of the instrument on a mount
    pub fn spec(&self, mount: Mount) -> Option<InstrumentSpec> {
        match mount {
            Mount::Single => self.single,
            Mount::Multi => self.multi,
        }
    }

    /// Whether a mount carries an instrument
    pub fn has(&self, mount: Mount) -> bool {
        self.spec(mount).is_some()
    }
}

/// Parameters of the add/mix/separate/aspirate cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CycleSettings {
    /// Mix repetitions after each dispense
    pub mix_repetitions: u16,
    /// Volume drawn per supernatant aspiration
    pub supernatant_volume: Volume,
    /// Aspiration height above the well bottom (0.1 mm)
    pub aspirate_height_x10: i16,
    /// Dispense height above the destination bottom (0.1 mm)
    pub dispense_height_x10: i16,
    /// Bead settle time on the separation device (seconds)
    pub settle_s: u16,
    /// Blow-out after reagent transfers
    pub blow_out: BlowOut,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            mix_repetitions: 10,
            supernatant_volume: Volume::from_ul(250),
            aspirate_height_x10: -10,
            dispense_height_x10: 50,
            settle_s: 60,
            blow_out: BlowOut::Destination,
        }
    }
}

impl CycleSettings {
    /// Settle time as a duration
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_s as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_instruments() {
        let instruments = Instruments::default();
        assert!(instruments.has(Mount::Single));
        assert!(instruments.has(Mount::Multi));
        assert_eq!(instruments.spec(Mount::Multi).map(|s| s.channels), Some(8));

        let single = Instruments::single_only();
        assert!(!single.has(Mount::Multi));
    }

    #[test]
    fn test_default_cycle_settings() {
        let settings = CycleSettings::default();
        assert_eq!(settings.supernatant_volume, Volume::from_ul(250));
        assert_eq!(settings.settle(), Duration::from_secs(60));
        assert_eq!(settings.aspirate_height_x10, -10);
    }
}
