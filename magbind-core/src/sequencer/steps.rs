//! Step parameters
//!
//! Plain data describing one unit of work. Protocols differ only in the
//! values they put here.

use crate::batch::{SourceGroup, Supply};
use crate::deck::ContainerId;
use crate::plate::Volume;

/// Repeated aspirate/dispense in one well
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mix {
    pub repetitions: u16,
    pub volume: Volume,
}

impl Mix {
    pub const fn new(repetitions: u16, volume: Volume) -> Self {
        Self {
            repetitions,
            volume,
        }
    }
}

/// Tip movement while mixing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MixPattern {
    /// Instrument mix at the default height
    #[default]
    InPlace,
    /// Start at the well bottom and raise the tip each repetition (0.1 mm)
    Ascending { step_x10: i16 },
}

/// A reagent addition to every selected well
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReagentAddition {
    /// Volume added per well
    pub volume: Volume,
    /// Where the reagent comes from
    pub supply: Supply,
    /// Container receiving the reagent
    pub destination: ContainerId,
    /// Mix at the source before aspirating
    pub premix: Option<Mix>,
    /// Mix in the destination after dispensing
    pub mix: Option<Mix>,
    /// How the destination mix moves the tip
    pub pattern: MixPattern,
}

impl ReagentAddition {
    /// Plain addition without mixing
    pub fn new(volume: Volume, supply: impl Into<Supply>, destination: ContainerId) -> Self {
        Self {
            volume,
            supply: supply.into(),
            destination,
            premix: None,
            mix: None,
            pattern: MixPattern::InPlace,
        }
    }

    pub fn with_premix(mut self, premix: Mix) -> Self {
        self.premix = Some(premix);
        self
    }

    pub fn with_mix(mut self, mix: Mix) -> Self {
        self.mix = Some(mix);
        self
    }

    pub fn with_pattern(mut self, pattern: MixPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Whether the addition needs explicit tip handling instead of one transfer
    pub(crate) fn is_stepwise(&self) -> bool {
        self.premix.is_some() || matches!(self.pattern, MixPattern::Ascending { .. })
    }
}

/// One add, mix, separate and aspirate cycle
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleStep {
    /// Reagent volume per well
    pub volume: Volume,
    /// Rotated reagent source
    pub source: SourceGroup,
    /// Container holding the samples
    pub sample: ContainerId,
    /// Container seated on the separation device
    pub separation: ContainerId,
    /// Supernatant aspirations per well
    pub aspirations: u8,
    /// Supernatant destination
    pub waste: ContainerId,
    /// Leave the separation container on the deck afterwards
    pub keep_on_separation: bool,
    /// Volume used when mixing after the addition
    pub mix_volume: Volume,
}

impl CycleStep {
    /// Three aspirations, 250 µL mix, separation container removed afterwards
    pub fn new(
        volume: Volume,
        source: SourceGroup,
        sample: ContainerId,
        separation: ContainerId,
        waste: ContainerId,
    ) -> Self {
        Self {
            volume,
            source,
            sample,
            separation,
            aspirations: 3,
            waste,
            keep_on_separation: false,
            mix_volume: Volume::from_ul(250),
        }
    }

    pub fn with_aspirations(mut self, aspirations: u8) -> Self {
        self.aspirations = aspirations;
        self
    }

    pub fn with_mix_volume(mut self, mix_volume: Volume) -> Self {
        self.mix_volume = mix_volume;
        self
    }

    /// Leave the separation container seated after the aspiration
    pub fn keep_on_separation(mut self) -> Self {
        self.keep_on_separation = true;
        self
    }
}
