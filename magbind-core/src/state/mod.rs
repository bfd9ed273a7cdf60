//! Cycle phase state machine
//!
//! Tracks where a purification cycle stands relative to the separation
//! device. The machine is explicit, finite and deterministic; the sequencer
//! feeds it events as physical steps complete.

pub mod events;
pub mod machine;

pub use events::CycleEvent;
pub use machine::CyclePhase;
