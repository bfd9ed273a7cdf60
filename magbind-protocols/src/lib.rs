//! Liquid-handling protocols
//!
//! Each protocol is a deck layout plus a `run` function that drives a
//! [`Sequencer`](magbind_core::sequencer::Sequencer). The purification
//! protocols share the add, mix, separate and aspirate cycle and differ only
//! in reagents, volumes and repeat counts:
//!
//! - [`purification::dna_rna`]: split DNA/RNA purification on two plates
//! - [`purification::extraction`]: DNA extraction with operator-added beads
//! - [`purification::total_rna`]: total RNA with DNase treatment
//!
//! The single-channel handling protocols work from volume grids or fixed
//! tube positions:
//!
//! - [`handling::normalization`]
//! - [`handling::pooling`]
//! - [`handling::dilution`]

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

mod common;
pub mod handling;
pub mod prep;
pub mod purification;

use core::fmt;

use magbind_core::batch::CHANNEL_COUNT;
use magbind_core::config::{CycleSettings, InstrumentSpec, Instruments};
use magbind_core::grid::FillRule;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use prep::{Fill, Preparation};

/// Every protocol the runner can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Protocol {
    DnaRnaPurification,
    DnaExtraction,
    TotalRna,
    Normalization,
    Pooling,
    Dilution,
}

impl Protocol {
    pub const ALL: [Protocol; 6] = [
        Protocol::DnaRnaPurification,
        Protocol::DnaExtraction,
        Protocol::TotalRna,
        Protocol::Normalization,
        Protocol::Pooling,
        Protocol::Dilution,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Protocol::DnaRnaPurification => "dna-rna-purification",
            Protocol::DnaExtraction => "dna-extraction",
            Protocol::TotalRna => "total-rna",
            Protocol::Normalization => "normalization",
            Protocol::Pooling => "pooling",
            Protocol::Dilution => "dilution",
        }
    }

    /// Whether the protocol runs the bead cycle with both pipettes
    pub fn is_purification(self) -> bool {
        matches!(
            self,
            Protocol::DnaRnaPurification | Protocol::DnaExtraction | Protocol::TotalRna
        )
    }

    /// Pipettes the protocol is written for
    pub fn instruments(self) -> Instruments {
        if self.is_purification() {
            Instruments::default()
        } else {
            Instruments::single(InstrumentSpec::p20_single())
        }
    }

    /// Cycle settings the protocol is written for
    pub fn settings(self) -> CycleSettings {
        match self {
            Protocol::TotalRna => CycleSettings {
                mix_repetitions: 50,
                ..CycleSettings::default()
            },
            _ => CycleSettings::default(),
        }
    }

    /// How the selection grid must be filled
    pub fn fill_rule(self) -> FillRule {
        match self {
            Protocol::Pooling | Protocol::Normalization => FillRule::Sparse,
            _ => FillRule::ColumnContiguous,
        }
    }

    /// Channels per batch when partitioning the selection
    pub fn channels(self) -> usize {
        if self.is_purification() {
            CHANNEL_COUNT
        } else {
            1
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magbind_core::traits::Mount;

    #[test]
    fn test_purification_uses_both_mounts() {
        for protocol in Protocol::ALL {
            let instruments = protocol.instruments();
            assert_eq!(instruments.has(Mount::Multi), protocol.is_purification());
            assert!(instruments.has(Mount::Single));
        }
    }

    #[test]
    fn test_total_rna_mixes_longer() {
        assert_eq!(Protocol::TotalRna.settings().mix_repetitions, 50);
        assert_eq!(Protocol::DnaExtraction.settings().mix_repetitions, 10);
    }

    #[test]
    fn test_sparse_protocols_use_single_channel() {
        assert_eq!(Protocol::Pooling.fill_rule(), FillRule::Sparse);
        assert_eq!(Protocol::Pooling.channels(), 1);
        assert_eq!(Protocol::TotalRna.fill_rule(), FillRule::ColumnContiguous);
    }
}
