//! Pooling
//!
//! 1 µL from each selected well of the DNA plate goes into tube A2, topped
//! up with water from tube A1 so the pool holds 100 µL.

use magbind_core::deck::{ContainerId, ContainerRole, DeckLocation, DeckState, WellRef};
use magbind_core::error::{ConfigError, RunError};
use magbind_core::plate::{Position, Volume, WELL_COUNT};
use magbind_core::sequencer::Sequencer;
use magbind_core::traits::{DeckController, LiquidHandler, Location, Mount};

use crate::common::{ul, FRESH_TIP};
use crate::prep::{Fill, Preparation};

/// Final pool volume
pub const POOL_VOLUME: Volume = ul(100);

/// Drawn from each selected well
pub const SAMPLE_VOLUME: Volume = ul(1);

const WATER_TUBE: Position = Position::A1;
const POOL_TUBE: Position = match Position::new(0, 1) {
    Some(position) => position,
    None => panic!("A2 lies outside the rack"),
};

/// Deck placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub dna_plate: ContainerId,
    pub tube_rack: ContainerId,
}

impl Layout {
    pub fn register(deck: &mut DeckState) -> Result<Self, ConfigError> {
        Ok(Self {
            dna_plate: deck.register("DNA plate", ContainerRole::Labware, DeckLocation::Slot(2))?,
            tube_rack: deck.register("tube rack", ContainerRole::Labware, DeckLocation::Slot(3))?,
        })
    }

    /// 100 µL DNA per selected well and a water tube
    pub fn preparation(&self) -> Preparation {
        Preparation::new()
            .fill(Fill::Selection(self.dna_plate, ul(100)))
            .fill(Fill::Well(WellRef::new(self.tube_rack, WATER_TUBE), ul(1_500)))
    }

    pub fn pool(&self) -> WellRef {
        WellRef::new(self.tube_rack, POOL_TUBE)
    }
}

/// Water needed to bring `samples` draws up to the pool volume
pub fn water_volume(samples: usize) -> Volume {
    POOL_VOLUME.saturating_sub(ul(samples as u32))
}

pub fn run<H, D>(seq: &mut Sequencer<H, D>, layout: &Layout) -> Result<(), RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    let selected: heapless::Vec<Position, WELL_COUNT> =
        seq.plan().positions().collect();
    let pool = Location::at(layout.pool());

    let water = Location::at(WellRef::new(layout.tube_rack, WATER_TUBE));
    seq.transfer(Mount::Single, water_volume(selected.len()), water, pool, &FRESH_TIP)?;

    for &position in &selected {
        let source = seq.well(layout.dna_plate, position)?;
        seq.transfer(Mount::Single, SAMPLE_VOLUME, Location::at(source), pool, &FRESH_TIP)?;
    }

    seq.finish()
}
