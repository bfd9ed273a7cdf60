//! Selection grid parsing
//!
//! Converts the spreadsheet-style plate tables operators paste into a run
//! configuration into per-position values and an ordered selection.

pub mod parser;

pub use parser::{
    parse_grid, Cell, FillRule, GridError, PositionGrid, SelectionList, VolumeMap,
};
