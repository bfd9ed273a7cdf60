//! Plate addressing
//!
//! Wells are addressed by row letter and column number on a fixed 8×12
//! plate. The canonical traversal order is column-major.

pub mod position;
pub mod volume;

pub use position::{Position, COLUMNS, ROWS, WELL_COUNT};
pub use volume::Volume;
