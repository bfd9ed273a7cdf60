//! Deck-state model
//!
//! Tracks which container sits in which slot. Relocation is the only
//! mutator and is validated before anything physical happens.

pub mod state;

pub use state::{
    Container, ContainerId, ContainerRole, DeckLocation, DeckState, WellRef, DECK_SLOTS,
    MAX_CONTAINERS, MAX_LABEL_LEN,
};
