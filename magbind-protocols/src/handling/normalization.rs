//! Normalization
//!
//! Two numeric grids give, per well, the water and the DNA volume to combine
//! in the water plate. Water from tube A1 goes out with a single tip; each
//! DNA transfer gets a fresh one.

use magbind_core::deck::{ContainerId, ContainerRole, DeckLocation, DeckState, WellRef};
use magbind_core::error::{ConfigError, RunError};
use magbind_core::grid::VolumeMap;
use magbind_core::plate::{Position, Volume, WELL_COUNT};
use magbind_core::sequencer::Sequencer;
use magbind_core::traits::{DeckController, LiquidHandler, Location, Mount};

use crate::common::{ul, FRESH_TIP, SAME_TIP};
use crate::prep::{Fill, Preparation};

/// Deck placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub tube_rack: ContainerId,
    pub water_plate: ContainerId,
    pub dna_plate: ContainerId,
}

impl Layout {
    pub fn register(deck: &mut DeckState) -> Result<Self, ConfigError> {
        Ok(Self {
            tube_rack: deck.register("tube rack", ContainerRole::Labware, DeckLocation::Slot(5))?,
            water_plate: deck.register("water plate", ContainerRole::Labware, DeckLocation::Slot(3))?,
            dna_plate: deck.register("DNA plate", ContainerRole::Labware, DeckLocation::Slot(2))?,
        })
    }

    /// Water tube and `dna` µL of DNA in every well of the DNA plate
    pub fn preparation(&self, dna: Volume) -> Preparation {
        Preparation::new()
            .fill(Fill::Well(WellRef::new(self.tube_rack, Position::A1), ul(1_500)))
            .fill(Fill::Container(self.dna_plate, dna))
    }
}

/// Water and DNA volume per well, column-major
pub type Pairs = heapless::Vec<(Position, Volume, Volume), WELL_COUNT>;

/// Pair each water entry with its DNA volume
///
/// Every well that receives water must have a DNA volume.
pub fn pairs(water: &VolumeMap, dna: &VolumeMap) -> Result<Pairs, ConfigError> {
    let mut out = Pairs::new();
    for &(position, water_volume) in water {
        let dna_volume = dna
            .iter()
            .find(|(p, _)| *p == position)
            .map(|(_, v)| *v)
            .ok_or(ConfigError::MissingVolume(position))?;
        // Both maps hold at most one entry per position
        let _ = out.push((position, water_volume, dna_volume));
    }
    Ok(out)
}

pub fn run<H, D>(
    seq: &mut Sequencer<H, D>,
    layout: &Layout,
    water: &VolumeMap,
    dna: &VolumeMap,
) -> Result<(), RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    let pairs = pairs(water, dna)?;
    let tube = Location::at(WellRef::new(layout.tube_rack, Position::A1));

    seq.pick_up_tip(Mount::Single)?;
    for &(position, volume, _) in &pairs {
        let dest = seq.well(layout.water_plate, position)?;
        seq.transfer(Mount::Single, volume, tube, Location::at(dest), &SAME_TIP)?;
    }
    seq.drop_tip(Mount::Single)?;

    for &(position, _, volume) in &pairs {
        let source = seq.well(layout.dna_plate, position)?;
        let dest = seq.well(layout.water_plate, position)?;
        seq.transfer(
            Mount::Single,
            volume,
            Location::at(source),
            Location::at(dest),
            &FRESH_TIP,
        )?;
    }

    seq.finish()
}
