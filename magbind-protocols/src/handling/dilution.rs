//! Dilution of one sample into five tubes
//!
//! Diluent (tube D2) goes into tubes A1..A5 with one tip, then the sample
//! (tube D1) is added to each with a fresh tip.

use magbind_core::deck::{ContainerId, ContainerRole, DeckLocation, DeckState, WellRef};
use magbind_core::error::{ConfigError, RunError};
use magbind_core::plate::{Position, Volume};
use magbind_core::sequencer::Sequencer;
use magbind_core::traits::{DeckController, LiquidHandler, Location, Mount};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::common::{ul, FRESH_TIP, SAME_TIP};
use crate::prep::{Fill, Preparation};

/// Number of dilution tubes
pub const TUBES: usize = 5;

const SAMPLE_TUBE: Position = tube(3, 0);
const DILUENT_TUBE: Position = tube(3, 1);
const DILUTION_TUBES: [Position; TUBES] = [
    tube(0, 0),
    tube(0, 1),
    tube(0, 2),
    tube(0, 3),
    tube(0, 4),
];

const fn tube(row: u8, column: u8) -> Position {
    match Position::new(row, column) {
        Some(position) => position,
        None => panic!("tube outside the rack"),
    }
}

/// Volumes for one dilution series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DilutionVolumes {
    /// Diluent per tube, 1-100 µL
    pub diluent: [Volume; TUBES],
    /// Sample added to each tube, 1-20 µL
    pub sample: Volume,
}

impl Default for DilutionVolumes {
    fn default() -> Self {
        Self {
            diluent: [ul(10), ul(20), ul(30), ul(40), ul(50)],
            sample: ul(1),
        }
    }
}

impl DilutionVolumes {
    /// Check every volume against its accepted range
    pub fn validate(&self) -> Result<(), ConfigError> {
        for volume in self.diluent {
            if volume < ul(1) || volume > ul(100) {
                return Err(ConfigError::VolumeOutOfRange(volume));
            }
        }
        if self.sample < ul(1) || self.sample > ul(20) {
            return Err(ConfigError::VolumeOutOfRange(self.sample));
        }
        Ok(())
    }
}

/// Deck placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub tube_rack: ContainerId,
}

impl Layout {
    pub fn register(deck: &mut DeckState) -> Result<Self, ConfigError> {
        Ok(Self {
            tube_rack: deck.register("tube rack", ContainerRole::Labware, DeckLocation::Slot(3))?,
        })
    }

    pub fn preparation(&self) -> Preparation {
        Preparation::new()
            .fill(Fill::Well(WellRef::new(self.tube_rack, SAMPLE_TUBE), ul(1_500)))
            .fill(Fill::Well(WellRef::new(self.tube_rack, DILUENT_TUBE), ul(1_500)))
    }

    /// Dilution tubes A1..A5
    pub fn targets(&self) -> impl Iterator<Item = WellRef> + '_ {
        DILUTION_TUBES
            .iter()
            .map(move |&position| WellRef::new(self.tube_rack, position))
    }
}

pub fn run<H, D>(
    seq: &mut Sequencer<H, D>,
    layout: &Layout,
    volumes: &DilutionVolumes,
) -> Result<(), RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    volumes.validate()?;
    let diluent = Location::at(WellRef::new(layout.tube_rack, DILUENT_TUBE));
    let sample = Location::at(WellRef::new(layout.tube_rack, SAMPLE_TUBE));

    seq.pick_up_tip(Mount::Single)?;
    for (target, volume) in layout.targets().zip(volumes.diluent) {
        seq.transfer(Mount::Single, volume, diluent, Location::at(target), &SAME_TIP)?;
    }
    seq.drop_tip(Mount::Single)?;

    for target in layout.targets() {
        seq.transfer(Mount::Single, volumes.sample, sample, Location::at(target), &FRESH_TIP)?;
    }

    seq.finish()
}
