//! Capacity checks
//!
//! Rejects explicit aspirate and mix volumes the mounted tips cannot hold
//! before anything is issued to the instrument.

pub mod capacity;

pub use capacity::{CapacityGuard, VolumeCheck};
