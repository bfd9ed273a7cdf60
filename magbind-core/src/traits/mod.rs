//! Collaborator traits
//!
//! These traits define the interface between the sequencer and the
//! hardware-specific (or simulated) implementations that actually move
//! liquid and labware.

pub mod deck;
pub mod handler;

pub use deck::DeckController;
pub use handler::{
    BlowOut, HandlerError, LiquidHandler, Location, Mount, TipPolicy, TransferOptions,
};
