//! Board-agnostic core logic for magnetic-bead purification protocols
//!
//! This crate contains all planning and sequencing logic that does not
//! depend on a specific robot or deck:
//!
//! - Plate addressing and fixed-point volumes
//! - Selection grid parsing with the column-major fill rule
//! - Batch partitioning, source rotation and channel dispatch
//! - Deck-state model for container relocation
//! - Step sequencer for the add/mix/separate/aspirate cycle
//! - Cycle phase state machine
//! - Capacity checks against the mounted instruments
//! - Collaborator traits (liquid handler, deck controller)
//! - Configuration and error types

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod batch;
pub mod config;
pub mod deck;
pub mod error;
pub mod grid;
pub mod plate;
pub mod safety;
pub mod sequencer;
pub mod state;
pub mod traits;

pub use error::{CapacityError, ConfigError, PhysicalStateError, RunError};
