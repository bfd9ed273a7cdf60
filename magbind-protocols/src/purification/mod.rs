//! Magnetic-bead purification protocols

pub mod dna_rna;
pub mod extraction;
pub mod total_rna;
