//! Total RNA purification
//!
//! Beads come pre-aliquoted in a plate that mirrors the sample layout and
//! are mixed in by walking the tip up from the well bottom. DNase I comes
//! from a tube in the tube rack.
//!
//! Reservoir columns: lysis buffer (1), ethanol (2), prep buffer (3),
//! water (4), wash 1 (5), wash 2 (6).

use magbind_core::batch::{SourceGroup, Supply};
use magbind_core::deck::{ContainerId, ContainerRole, DeckLocation, DeckState, WellRef};
use magbind_core::error::{ConfigError, RunError};
use magbind_core::plate::{Position, Volume};
use magbind_core::sequencer::{CycleStep, Mix, MixPattern, ReagentAddition, Sequencer};
use magbind_core::traits::{DeckController, LiquidHandler};

use crate::common::{minutes, pellet, release, seat, ul};
use crate::prep::{Fill, Preparation};

/// Mix volume after each reagent addition
const MIX_VOLUME: Volume = ul(200);

/// Bead mix: 50 strokes of 250 µL, rising 2 mm per stroke
const BEAD_MIX: Mix = Mix::new(50, ul(250));
const BEAD_STEP_X10: i16 = 20;

/// DNase I tube in the rack
const DNASE_TUBE: Position = match Position::new(3, 5) {
    Some(position) => position,
    None => panic!("D6 lies outside the rack"),
};

/// Deck placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub sample_plate: ContainerId,
    pub reservoir: ContainerId,
    pub tube_rack: ContainerId,
    pub beads_plate: ContainerId,
    pub eluted_rna: ContainerId,
    pub waste: ContainerId,
    pub magnet: ContainerId,
}

impl Layout {
    pub fn register(deck: &mut DeckState) -> Result<Self, ConfigError> {
        Ok(Self {
            sample_plate: deck.register("sample plate", ContainerRole::Labware, DeckLocation::Slot(6))?,
            reservoir: deck.register("reservoir", ContainerRole::Reservoir, DeckLocation::Slot(3))?,
            tube_rack: deck.register("tube rack", ContainerRole::Labware, DeckLocation::Slot(2))?,
            beads_plate: deck.register("beads plate", ContainerRole::Labware, DeckLocation::Slot(1))?,
            eluted_rna: deck.register("eluted RNA", ContainerRole::Labware, DeckLocation::Slot(8))?,
            waste: deck.register("liquid waste", ContainerRole::Waste, DeckLocation::Slot(9))?,
            magnet: deck.register("magnet plate", ContainerRole::Separation, DeckLocation::OffDeck)?,
        })
    }

    /// 200 µL sample and 100 µL beads per selected well
    pub fn preparation(&self) -> Preparation {
        Preparation::new()
            .fill(Fill::Selection(self.sample_plate, ul(200)))
            .fill(Fill::Selection(self.beads_plate, ul(100)))
            .fill(Fill::Container(self.reservoir, ul(15_000)))
            .fill(Fill::Well(self.dnase(), ul(1_500)))
            .share(self.magnet, self.sample_plate)
    }

    fn column(&self, column: u8) -> Result<SourceGroup, ConfigError> {
        SourceGroup::span(self.reservoir, column, 1)
    }

    fn dnase(&self) -> WellRef {
        WellRef::new(self.tube_rack, DNASE_TUBE)
    }

    fn wash(&self, column: u8) -> Result<CycleStep, ConfigError> {
        Ok(CycleStep::new(ul(500), self.column(column)?, self.sample_plate, self.magnet, self.waste)
            .with_mix_volume(MIX_VOLUME))
    }
}

pub fn run<H, D>(seq: &mut Sequencer<H, D>, layout: &Layout) -> Result<(), RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    let l = layout;
    let settle = seq.settings().settle();
    let (lysis, ethanol, prep, water, wash_1, wash_2) = (0, 1, 2, 3, 4, 5);

    seq.dispense_and_mix(ul(200), &l.column(lysis)?, l.sample_plate, MIX_VOLUME)?;
    seq.dispense_and_mix(ul(400), &l.column(ethanol)?, l.sample_plate, MIX_VOLUME)?;

    let beads = ReagentAddition::new(ul(30), Supply::Matching(l.beads_plate), l.sample_plate)
        .with_premix(Mix::new(5, ul(40)))
        .with_mix(BEAD_MIX)
        .with_pattern(MixPattern::Ascending {
            step_x10: BEAD_STEP_X10,
        });
    seq.add_reagent(&beads)?;

    pellet(seq, l.sample_plate, l.magnet, minutes(10), 4, l.waste)?;
    release(seq, l.sample_plate, l.magnet)?;

    seq.cycle(&l.wash(wash_1)?)?;
    seq.cycle(&l.wash(wash_2)?)?;
    seq.cycle(&l.wash(ethanol)?)?;
    seq.cycle(&l.wash(ethanol)?)?;

    // DNase I treatment
    let dnase = SourceGroup::single(l.dnase());
    seq.dispense_and_mix(ul(50), &dnase, l.sample_plate, ul(50))?;
    seq.cycle(&l.wash(prep)?)?;
    seq.cycle(&l.wash(ethanol)?)?;
    seq.cycle(&l.wash(ethanol)?.keep_on_separation())?;

    // Dry
    seq.wait(minutes(10))?;
    release(seq, l.sample_plate, l.magnet)?;

    // Elute
    seq.dispense_and_mix(ul(55), &l.column(water)?, l.sample_plate, ul(50))?;
    seq.wait(minutes(5))?;
    seat(seq, l.sample_plate, l.magnet)?;
    seq.settle(settle)?;
    seq.transfer_each(ul(50), l.magnet, l.eluted_rna)?;

    seq.finish()
}
