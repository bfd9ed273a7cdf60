//! Single-channel liquid handling protocols

pub mod dilution;
pub mod normalization;
pub mod pooling;
