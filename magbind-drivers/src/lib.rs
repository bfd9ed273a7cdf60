//! Collaborator implementations
//!
//! This crate provides concrete implementations of the traits defined in
//! magbind-core:
//!
//! - `SimHandler`: liquid handler tracking tips and per-well volumes
//! - `SimDeck`: deck controller recording moves, waits and pauses
//!
//! Both append to a shared [`sim::OpLog`] so a run can be replayed or
//! printed in the exact order operations were issued.

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod sim;
