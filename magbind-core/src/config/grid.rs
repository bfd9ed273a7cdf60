//! Grid configuration

use crate::error::ConfigError;
use crate::grid::{parse_grid, FillRule, PositionGrid, SelectionList};

/// A plate table plus the fill rule it must satisfy
///
/// This is the only path from run configuration to the grid parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig<'a> {
    /// Tab or comma separated table text
    pub table: &'a str,
    /// Required layout of filled cells
    pub fill: FillRule,
}

impl<'a> GridConfig<'a> {
    /// Column-contiguous table
    pub const fn new(table: &'a str) -> Self {
        Self {
            table,
            fill: FillRule::ColumnContiguous,
        }
    }

    /// Table with arbitrary selection
    pub const fn sparse(table: &'a str) -> Self {
        Self {
            table,
            fill: FillRule::Sparse,
        }
    }

    /// Parse and validate the table
    pub fn load(&self) -> Result<PositionGrid, ConfigError> {
        let grid = parse_grid(self.table)?;
        grid.check_fill(self.fill)?;
        Ok(grid)
    }

    /// Parse, validate and return the selection
    pub fn selection(&self) -> Result<SelectionList, ConfigError> {
        self.load().map(|g| g.selection())
    }
}
