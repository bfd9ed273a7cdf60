//! Deck controller trait

use core::time::Duration;

use crate::deck::{ContainerId, DeckLocation};
use crate::traits::HandlerError;

/// Trait for the deck-state collaborator
///
/// Moves labware between slots and blocks for timed or operator waits.
/// The sequencer validates every move against its own deck model before
/// calling [`DeckController::move_container`].
pub trait DeckController {
    /// Physically move a container
    fn move_container(
        &mut self,
        container: ContainerId,
        to: DeckLocation,
    ) -> Result<(), HandlerError>;

    /// Block for a fixed duration
    ///
    /// There is no cancellation; the wait always runs to completion.
    fn delay(&mut self, duration: Duration);

    /// Block until an operator resumes the run
    fn pause(&mut self, message: &str);
}
