//! Events that trigger phase transitions

/// Events raised by the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleEvent {
    // Liquid events
    /// Reagent dispensed, mixing started
    BeginMix,
    /// Mixing finished for every target
    MixComplete,

    // Separation events
    /// Separation container placed into its working slot
    PlacedOnSeparator,
    /// Settle wait ran to completion
    SettleElapsed,
    /// Supernatant aspirated from every target
    SupernatantRemoved,
    /// Separation container taken off the deck
    RemovedFromSeparator,

    // Lifecycle events
    /// Protocol reached its end
    RunFinished,
    /// Any step failed
    Fault,
}
