//! Step sequencing
//!
//! Composes the batch plan, deck model and collaborators into the
//! purification steps protocols are written in.

pub mod executor;
pub mod steps;

pub use executor::Sequencer;
pub use steps::{CycleStep, Mix, MixPattern, ReagentAddition};
