//! Simulated instrument

pub mod deck;
pub mod handler;
pub mod oplog;

pub use deck::SimDeck;
pub use handler::{
    Geometry, SimHandler, BULK_CAPACITY, PLATE_WELL_CAPACITY, RESERVOIR_WELL_CAPACITY,
};
pub use oplog::{Op, OpLog};
