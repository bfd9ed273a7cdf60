//! Steps shared by the protocols

use core::time::Duration;

use magbind_core::deck::{ContainerId, DeckLocation};
use magbind_core::error::{PhysicalStateError, RunError};
use magbind_core::plate::Volume;
use magbind_core::sequencer::Sequencer;
use magbind_core::traits::{BlowOut, DeckController, LiquidHandler, TipPolicy, TransferOptions};

pub(crate) const fn ul(volume: u32) -> Volume {
    Volume::from_ul(volume)
}

pub(crate) const fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

/// Fresh tip, blow out into the destination
pub(crate) const FRESH_TIP: TransferOptions = TransferOptions {
    tips: TipPolicy::Always,
    blow_out: BlowOut::Destination,
    mix_after: None,
};

/// Keep the attached tip, blow out into the destination
pub(crate) const SAME_TIP: TransferOptions = TransferOptions {
    tips: TipPolicy::Never,
    blow_out: BlowOut::Destination,
    mix_after: None,
};

fn slot_of<H, D>(seq: &Sequencer<H, D>, container: ContainerId) -> Result<u8, RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    match seq.deck().location(container)? {
        DeckLocation::Slot(slot) => Ok(slot),
        DeckLocation::OffDeck => Err(PhysicalStateError::NotOnDeck(container).into()),
    }
}

/// Seat the separation container in place of the sample container, wait
/// for the beads and draw the supernatant off into `into`
pub(crate) fn pellet<H, D>(
    seq: &mut Sequencer<H, D>,
    sample: ContainerId,
    separation: ContainerId,
    settle: Duration,
    aspirations: u8,
    into: ContainerId,
) -> Result<(), RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    seat(seq, sample, separation)?;
    seq.settle(settle)?;
    seq.remove_supernatant(aspirations, separation, into)
}

/// Swap the sample container off the deck and the separation container in
pub(crate) fn seat<H, D>(
    seq: &mut Sequencer<H, D>,
    sample: ContainerId,
    separation: ContainerId,
) -> Result<(), RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    let slot = slot_of(seq, sample)?;
    seq.relocate(sample, DeckLocation::OffDeck)?;
    seq.relocate(separation, DeckLocation::Slot(slot))
}

/// Undo [`seat`]
pub(crate) fn release<H, D>(
    seq: &mut Sequencer<H, D>,
    sample: ContainerId,
    separation: ContainerId,
) -> Result<(), RunError>
where
    H: LiquidHandler,
    D: DeckController,
{
    let slot = slot_of(seq, separation)?;
    seq.relocate(separation, DeckLocation::OffDeck)?;
    seq.relocate(sample, DeckLocation::Slot(slot))
}
