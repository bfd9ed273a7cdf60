//! DNA extraction and purification
//!
//! Lysate in AL buffer is bound in HDQ binding buffer with beads the
//! operator adds by hand, washed twice in VHB buffer and once in SPM buffer,
//! dried on the magnet and eluted into a fresh plate.

use magbind_core::batch::SourceGroup;
use magbind_core::deck::{ContainerId, ContainerRole, DeckLocation, DeckState, WellRef};
use magbind_core::error::{ConfigError, RunError};
use magbind_core::plate::Position;
use magbind_core::sequencer::{CycleStep, Mix, ReagentAddition, Sequencer};
use magbind_core::traits::{DeckController, LiquidHandler};

use crate::common::{minutes, pellet, release, seat, ul};
use crate::prep::{Fill, Preparation};

/// Operator prompt before the bead mix
pub const ADD_BEADS: &str = "Add binding beads.";

/// Deck placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub sample_plate: ContainerId,
    /// AL buffer (1-4), binding buffer (5-8), VHB buffer (9-12)
    pub buffers: ContainerId,
    /// Single-well SPM buffer
    pub spm_buffer: ContainerId,
    /// Single-well elution buffer
    pub elution_buffer: ContainerId,
    pub magnet: ContainerId,
    pub dna_plate: ContainerId,
    pub waste: ContainerId,
}

impl Layout {
    pub fn register(deck: &mut DeckState) -> Result<Self, ConfigError> {
        Ok(Self {
            sample_plate: deck.register("sample plate", ContainerRole::Labware, DeckLocation::Slot(6))?,
            buffers: deck.register("buffers", ContainerRole::Reservoir, DeckLocation::Slot(3))?,
            spm_buffer: deck.register("SPM buffer", ContainerRole::Reservoir, DeckLocation::Slot(2))?,
            elution_buffer: deck.register("elution buffer", ContainerRole::Reservoir, DeckLocation::Slot(1))?,
            magnet: deck.register("magnet plate", ContainerRole::Separation, DeckLocation::OffDeck)?,
            dna_plate: deck.register("DNA plate", ContainerRole::Labware, DeckLocation::Slot(8))?,
            waste: deck.register("liquid waste", ContainerRole::Waste, DeckLocation::Slot(9))?,
        })
    }

    /// 10 µL sample per selected well
    pub fn preparation(&self) -> Preparation {
        Preparation::new()
            .fill(Fill::Selection(self.sample_plate, ul(10)))
            .fill(Fill::Container(self.buffers, ul(15_000)))
            .fill(Fill::Container(self.spm_buffer, ul(100_000)))
            .fill(Fill::Container(self.elution_buffer, ul(20_000)))
            .single_well(self.spm_buffer)
            .single_well(self.elution_buffer)
            .share(self.magnet, self.sample_plate)
    }

    fn bulk(container: ContainerId) -> SourceGroup {
        SourceGroup::single(WellRef::new(container, Position::A1))
    }

    fn wash(&self, volume_ul: u32, source: SourceGroup) -> CycleStep {
        CycleStep::new(ul(volume_ul), source, self.sample_plate, self.magnet, self.waste)
            .with_aspirations(4)
    }
}

pub fn run<H, D>(seq: &mut Sequencer<H, D>, layout: &Layout) -> Result<(), RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    let l = layout;
    let settle = seq.settings().settle();

    seq.dispense_and_mix(
        ul(230),
        &SourceGroup::span(l.buffers, 0, 4)?,
        l.sample_plate,
        ul(250),
    )?;

    // Binding buffer goes in unmixed; beads follow by hand
    let binding = ReagentAddition::new(ul(320), SourceGroup::span(l.buffers, 4, 4)?, l.sample_plate);
    seq.add_reagent(&binding)?;
    seq.pause(ADD_BEADS)?;
    seq.mix_each(l.sample_plate, Mix::new(20, ul(250)))?;

    pellet(seq, l.sample_plate, l.magnet, settle, 4, l.waste)?;
    release(seq, l.sample_plate, l.magnet)?;

    let vhb = SourceGroup::span(l.buffers, 8, 4)?;
    for _ in 0..2 {
        seq.cycle(&l.wash(600, vhb.clone()))?;
    }

    // SPM wash, then a second pass for the residue
    seq.cycle(&l.wash(600, Layout::bulk(l.spm_buffer)).keep_on_separation())?;
    seq.wait(settle)?;
    seq.remove_supernatant(2, l.magnet, l.waste)?;

    seq.wait(minutes(10))?;
    release(seq, l.sample_plate, l.magnet)?;

    seq.dispense_and_mix(ul(110), &Layout::bulk(l.elution_buffer), l.sample_plate, ul(250))?;
    seat(seq, l.sample_plate, l.magnet)?;
    seq.settle(settle)?;
    seq.transfer_each(ul(100), l.magnet, l.dna_plate)?;

    seq.finish()
}
