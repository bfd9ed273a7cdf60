//! DNA and RNA purification from one lysate
//!
//! The lysate is bound to beads on the DNA plate; the cleared supernatant
//! carries the RNA over to a second plate. Both plates then run their own
//! wash cycles on separate magnet plates, interleaved so neither sits idle,
//! and are eluted into their own output plates.
//!
//! Reservoir 1 holds lysis buffer (columns 1-4), wash 1 (5-8) and wash 2
//! (9-12). Reservoir 2 holds water (1-2), ethanol (3-6), DNase I mix (7),
//! prep buffer (8-9) and beads (10).

use magbind_core::batch::SourceGroup;
use magbind_core::deck::{ContainerId, ContainerRole, DeckLocation, DeckState};
use magbind_core::error::{ConfigError, RunError};
use magbind_core::sequencer::{CycleStep, Mix, ReagentAddition, Sequencer};
use magbind_core::traits::{DeckController, LiquidHandler};

use crate::common::{minutes, pellet, release, seat, ul};
use crate::prep::{Fill, Preparation};

/// Deck placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub dna_plate: ContainerId,
    pub rna_plate: ContainerId,
    pub reservoir_1: ContainerId,
    pub reservoir_2: ContainerId,
    pub dna_magnet: ContainerId,
    pub rna_magnet: ContainerId,
    pub eluted_dna: ContainerId,
    pub eluted_rna: ContainerId,
    pub waste: ContainerId,
}

impl Layout {
    pub fn register(deck: &mut DeckState) -> Result<Self, ConfigError> {
        Ok(Self {
            dna_plate: deck.register("DNA plate", ContainerRole::Labware, DeckLocation::Slot(5))?,
            rna_plate: deck.register("RNA plate", ContainerRole::Labware, DeckLocation::Slot(6))?,
            reservoir_1: deck.register("reservoir 1", ContainerRole::Reservoir, DeckLocation::Slot(2))?,
            reservoir_2: deck.register("reservoir 2", ContainerRole::Reservoir, DeckLocation::Slot(3))?,
            dna_magnet: deck.register("DNA magnet plate", ContainerRole::Separation, DeckLocation::OffDeck)?,
            rna_magnet: deck.register("RNA magnet plate", ContainerRole::Separation, DeckLocation::OffDeck)?,
            eluted_dna: deck.register("eluted DNA", ContainerRole::Labware, DeckLocation::Slot(8))?,
            eluted_rna: deck.register("eluted RNA", ContainerRole::Labware, DeckLocation::Slot(9))?,
            waste: deck.register("liquid waste", ContainerRole::Waste, DeckLocation::Slot(7))?,
        })
    }

    /// 200 µL lysate per selected well, both reservoirs full
    pub fn preparation(&self) -> Preparation {
        Preparation::new()
            .fill(Fill::Selection(self.dna_plate, ul(200)))
            .fill(Fill::Container(self.reservoir_1, ul(15_000)))
            .fill(Fill::Container(self.reservoir_2, ul(15_000)))
            .share(self.dna_magnet, self.dna_plate)
            .share(self.rna_magnet, self.rna_plate)
    }

    fn lysis_buffer(&self) -> Result<SourceGroup, ConfigError> {
        SourceGroup::span(self.reservoir_1, 0, 4)
    }

    fn wash_1(&self) -> Result<SourceGroup, ConfigError> {
        SourceGroup::span(self.reservoir_1, 4, 4)
    }

    fn wash_2(&self) -> Result<SourceGroup, ConfigError> {
        SourceGroup::span(self.reservoir_1, 8, 4)
    }

    fn water(&self) -> Result<SourceGroup, ConfigError> {
        SourceGroup::span(self.reservoir_2, 0, 2)
    }

    fn ethanol(&self) -> Result<SourceGroup, ConfigError> {
        SourceGroup::span(self.reservoir_2, 2, 4)
    }

    fn dnase(&self) -> Result<SourceGroup, ConfigError> {
        SourceGroup::span(self.reservoir_2, 6, 1)
    }

    fn prep_buffer(&self) -> Result<SourceGroup, ConfigError> {
        SourceGroup::span(self.reservoir_2, 7, 2)
    }

    fn beads(&self) -> Result<SourceGroup, ConfigError> {
        SourceGroup::span(self.reservoir_2, 9, 1)
    }

    fn dna_wash(&self, source: SourceGroup) -> CycleStep {
        CycleStep::new(ul(500), source, self.dna_plate, self.dna_magnet, self.waste)
    }

    fn rna_wash(&self, source: SourceGroup) -> CycleStep {
        CycleStep::new(ul(500), source, self.rna_plate, self.rna_magnet, self.waste)
    }

    /// 30 µL beads with a premix at the source, then a 10x mix
    fn bind(&self, destination: ContainerId) -> Result<ReagentAddition, ConfigError> {
        Ok(ReagentAddition::new(ul(30), self.beads()?, destination)
            .with_premix(Mix::new(5, ul(40)))
            .with_mix(Mix::new(10, ul(250))))
    }
}

pub fn run<H, D>(seq: &mut Sequencer<H, D>, layout: &Layout) -> Result<(), RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    let l = layout;
    let settle = seq.settings().settle();

    // Lysis and DNA binding
    seq.dispense_and_mix(ul(500), &l.lysis_buffer()?, l.dna_plate, ul(250))?;
    seq.add_reagent(&l.bind(l.dna_plate)?)?;

    // The cleared supernatant is the RNA fraction
    pellet(seq, l.dna_plate, l.dna_magnet, settle, 3, l.rna_plate)?;
    release(seq, l.dna_plate, l.dna_magnet)?;

    seq.cycle(&l.dna_wash(l.wash_1()?))?;
    seq.dispense_and_mix(ul(700), &l.ethanol()?, l.rna_plate, ul(250))?;

    seq.cycle(&l.dna_wash(l.wash_2()?))?;
    seq.add_reagent(&l.bind(l.rna_plate)?)?;

    seq.cycle(&l.dna_wash(l.ethanol()?))?;
    pellet(seq, l.rna_plate, l.rna_magnet, settle, 4, l.waste)?;
    release(seq, l.rna_plate, l.rna_magnet)?;

    seq.cycle(&l.dna_wash(l.ethanol()?))?;
    seq.cycle(&l.rna_wash(l.wash_1()?))?;

    // DNA beads dry while the RNA plate keeps washing
    seq.wait(minutes(10))?;
    seq.cycle(&l.rna_wash(l.wash_2()?))?;

    seq.dispense_and_mix(ul(50), &l.water()?, l.dna_plate, ul(30))?;
    seq.cycle(&l.rna_wash(l.ethanol()?))?;

    // DNA elution; the DNA plate stays off the deck afterwards
    pellet(seq, l.dna_plate, l.dna_magnet, settle, 1, l.eluted_dna)?;
    seq.relocate(l.dna_magnet, DeckLocation::OffDeck)?;
    seq.cycle(&l.rna_wash(l.ethanol()?))?;

    // DNase I treatment
    seq.dispense_and_mix(ul(50), &l.dnase()?, l.rna_plate, ul(30))?;
    seq.cycle(&l.rna_wash(l.prep_buffer()?))?;
    seq.cycle(&l.rna_wash(l.ethanol()?))?;
    seq.cycle(&l.rna_wash(l.ethanol()?).keep_on_separation())?;

    seq.wait(minutes(10))?;
    release(seq, l.rna_plate, l.rna_magnet)?;

    // RNA elution
    seq.dispense_and_mix(ul(50), &l.water()?, l.rna_plate, ul(30))?;
    seat(seq, l.rna_plate, l.rna_magnet)?;
    seq.settle(settle)?;
    seq.remove_supernatant(1, l.rna_magnet, l.eluted_rna)?;

    seq.finish()
}
