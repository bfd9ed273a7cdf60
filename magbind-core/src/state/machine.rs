//! Phase machine definition
//!
//! Which sequencer steps are meaningful is a function of the current phase
//! and an event.

use super::events::CycleEvent;

/// Cycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CyclePhase {
    /// Samples on their working slot, no separation in progress
    #[default]
    Ready,
    /// Reagent added, mixing in progress
    Mixing,
    /// Separation container placed, beads not yet settled
    AwaitingSeparation,
    /// Beads settled, supernatant being removed
    Aspirating,
    /// Supernatant removed; container still on the separation device
    Settled,
    /// Protocol finished
    Complete,
    /// A step failed; nothing further runs
    Faulted,
}

impl CyclePhase {
    /// Phase in which supernatant may be aspirated
    pub fn aspiration_allowed(&self) -> bool {
        matches!(
            self,
            CyclePhase::AwaitingSeparation | CyclePhase::Aspirating | CyclePhase::Settled
        )
    }

    /// Check if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, CyclePhase::Complete | CyclePhase::Faulted)
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: CycleEvent) -> Self {
        use CycleEvent::*;
        use CyclePhase::*;

        match (self, event) {
            // Faults win from anywhere
            (_, Fault) => Faulted,

            // Terminal phases absorb everything else
            (Complete | Faulted, _) => self,

            (_, RunFinished) => Complete,
            (_, PlacedOnSeparator) => AwaitingSeparation,

            // Mixing
            (Ready | Settled, BeginMix) => Mixing,
            (Mixing, MixComplete) => Ready,

            // Separation
            (AwaitingSeparation | Settled, SettleElapsed) => Aspirating,
            (Aspirating, SupernatantRemoved) => Settled,
            (AwaitingSeparation | Aspirating | Settled, RemovedFromSeparator) => Ready,

            // Default: stay in current phase
            _ => self,
        }
    }
}
