//! Plate table parser
//!
//! Input layout (tabs or commas, or a mix of both):
//!
//! ```text
//! 	1	2	3	…	12
//! A	TRUE	TRUE	FALSE	…
//! B	TRUE	FALSE	FALSE	…
//! ```
//!
//! The first non-blank line is the header; its first cell is the empty
//! row-label column. Each following line starts with a row letter. Cells are
//! blank, `TRUE`/`FALSE`, or a non-negative decimal volume.

use core::fmt;

use heapless::Vec;

use crate::plate::{position::row_from_letter, Position, Volume, COLUMNS, ROWS, WELL_COUNT};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered active positions, column-major
pub type SelectionList = Vec<Position, WELL_COUNT>;

/// Set volume cells, column-major
pub type VolumeMap = Vec<(Position, Volume), WELL_COUNT>;

/// Grid parse and validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GridError {
    /// No header line
    MissingHeader,
    /// Header cell is not a column number 1..=12 (1-based line number)
    InvalidColumn { line: usize },
    /// Column number appears twice in the header
    DuplicateColumn { column: u8 },
    /// Row label is not a letter A..=H
    InvalidRow { line: usize },
    /// Row letter appears twice
    DuplicateRow { row: char },
    /// Cell is neither blank, a boolean token nor a volume
    InvalidCell { position: Position },
    /// Non-blank cell beyond the header's columns
    UnexpectedCell { line: usize },
    /// Boolean and volume cells in the same table
    MixedCells { position: Position },
    /// A filled cell follows an unfilled one in column-major order
    NotColumnContiguous { gap: Position, filled: Position },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::MissingHeader => write!(f, "missing header row"),
            GridError::InvalidColumn { line } => write!(f, "line {}: invalid column header", line),
            GridError::DuplicateColumn { column } => write!(f, "column {} listed twice", column),
            GridError::InvalidRow { line } => write!(f, "line {}: row label must be A-H", line),
            GridError::DuplicateRow { row } => write!(f, "row {} listed twice", row),
            GridError::InvalidCell { position } => write!(f, "{}: unreadable cell", position),
            GridError::UnexpectedCell { line } => {
                write!(f, "line {}: cell outside the header columns", line)
            }
            GridError::MixedCells { position } => {
                write!(f, "{}: boolean and volume cells mixed", position)
            }
            GridError::NotColumnContiguous { gap, filled } => write!(
                f,
                "{} is filled but {} before it is empty; fill each column before the next",
                filled, gap
            ),
        }
    }
}

/// How filled cells must be laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FillRule {
    /// Filled cells form a prefix of the column-major order
    #[default]
    ColumnContiguous,
    /// Any selection; used by well-by-well workflows
    Sparse,
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cell {
    #[default]
    Empty,
    Flag(bool),
    Volume(Volume),
}

impl Cell {
    /// Cell holds a value that marks the well as used
    pub fn is_set(self) -> bool {
        matches!(self, Cell::Flag(true) | Cell::Volume(_))
    }

    /// Cell selects the well for processing
    pub fn is_selected(self) -> bool {
        match self {
            Cell::Flag(on) => on,
            Cell::Volume(v) => !v.is_zero(),
            Cell::Empty => false,
        }
    }

    fn is_flag(self) -> bool {
        matches!(self, Cell::Flag(_))
    }
}

/// An 8×12 plate of cells, stored column-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionGrid {
    cells: [Cell; WELL_COUNT],
}

impl Default for PositionGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl PositionGrid {
    /// Grid with every cell empty
    pub const fn empty() -> Self {
        Self {
            cells: [Cell::Empty; WELL_COUNT],
        }
    }

    /// Cell at a position
    pub fn cell(&self, position: Position) -> Cell {
        self.cells[position.index()]
    }

    /// Overwrite a cell
    pub fn set(&mut self, position: Position, cell: Cell) {
        self.cells[position.index()] = cell;
    }

    /// Volume at a position, if the cell holds one
    pub fn volume(&self, position: Position) -> Option<Volume> {
        match self.cell(position) {
            Cell::Volume(v) => Some(v),
            _ => None,
        }
    }

    /// Selected positions in column-major order
    pub fn selection(&self) -> SelectionList {
        Position::all()
            .filter(|&p| self.cell(p).is_selected())
            .collect()
    }

    /// Every volume cell in column-major order; blank cells are omitted
    pub fn volumes(&self) -> VolumeMap {
        Position::all()
            .filter_map(|p| self.volume(p).map(|v| (p, v)))
            .collect()
    }

    /// Validate the layout of filled cells
    pub fn check_fill(&self, rule: FillRule) -> Result<(), GridError> {
        if rule == FillRule::Sparse {
            return Ok(());
        }

        let mut gap: Option<Position> = None;
        for p in Position::all() {
            if self.cell(p).is_set() {
                if let Some(gap) = gap {
                    return Err(GridError::NotColumnContiguous { gap, filled: p });
                }
            } else if gap.is_none() {
                gap = Some(p);
            }
        }
        Ok(())
    }
}

/// Parse a plate table
///
/// Fails on the first malformed line; no partial grid is returned. The
/// fill rule is not checked here, see [`PositionGrid::check_fill`].
pub fn parse_grid(input: &str) -> Result<PositionGrid, GridError> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());

    let (header_line, header) = lines.next().ok_or(GridError::MissingHeader)?;
    let columns = parse_header(header, header_line)?;

    let mut grid = PositionGrid::empty();
    let mut seen_rows = [false; ROWS];
    let mut flags: Option<bool> = None;

    for (line_no, line) in lines {
        let mut cells = split_cells(line);
        let label = cells.next().unwrap_or("").trim();
        let row = parse_row_label(label).ok_or(GridError::InvalidRow { line: line_no })?;

        if seen_rows[row as usize] {
            return Err(GridError::DuplicateRow {
                row: (b'A' + row) as char,
            });
        }
        seen_rows[row as usize] = true;

        for (i, raw) in cells.enumerate() {
            let raw = raw.trim();
            let Some(&column) = columns.get(i) else {
                if raw.is_empty() {
                    continue;
                }
                return Err(GridError::UnexpectedCell { line: line_no });
            };

            let position =
                Position::new(row, column).ok_or(GridError::InvalidColumn { line: header_line })?;
            let cell = parse_cell(raw).ok_or(GridError::InvalidCell { position })?;

            if cell != Cell::Empty {
                match flags {
                    Some(f) if f != cell.is_flag() => {
                        return Err(GridError::MixedCells { position });
                    }
                    _ => flags = Some(cell.is_flag()),
                }
            }

            grid.set(position, cell);
        }
    }

    trace!("Parsed grid with {} selected wells", grid.selection().len());
    Ok(grid)
}

fn split_cells(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c| c == '\t' || c == ',')
}

/// Parse the header into zero-based column indices
fn parse_header(line: &str, line_no: usize) -> Result<Vec<u8, COLUMNS>, GridError> {
    let mut cells = split_cells(line);
    if !cells.next().unwrap_or("").trim().is_empty() {
        return Err(GridError::InvalidColumn { line: line_no });
    }

    let mut raw: Vec<&str, { COLUMNS + 1 }> = Vec::new();
    for cell in cells {
        raw.push(cell.trim())
            .map_err(|_| GridError::InvalidColumn { line: line_no })?;
    }
    while raw.last().is_some_and(|c| c.is_empty()) {
        raw.pop();
    }
    if raw.len() > COLUMNS {
        return Err(GridError::InvalidColumn { line: line_no });
    }

    let mut columns: Vec<u8, COLUMNS> = Vec::new();
    for cell in raw {
        let number: u8 = cell
            .parse()
            .map_err(|_| GridError::InvalidColumn { line: line_no })?;
        if number == 0 || number as usize > COLUMNS {
            return Err(GridError::InvalidColumn { line: line_no });
        }
        if columns.contains(&(number - 1)) {
            return Err(GridError::DuplicateColumn { column: number });
        }
        columns
            .push(number - 1)
            .map_err(|_| GridError::InvalidColumn { line: line_no })?;
    }
    Ok(columns)
}

fn parse_row_label(label: &str) -> Option<u8> {
    match label.as_bytes() {
        [letter] => row_from_letter(*letter),
        _ => None,
    }
}

fn parse_cell(raw: &str) -> Option<Cell> {
    if raw.is_empty() {
        Some(Cell::Empty)
    } else if raw.eq_ignore_ascii_case("true") {
        Some(Cell::Flag(true))
    } else if raw.eq_ignore_ascii_case("false") {
        Some(Cell::Flag(false))
    } else {
        Volume::parse(raw).map(Cell::Volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::string::String;
    use std::vec::Vec as StdVec;

    use proptest::prelude::*;

    /// Build a tab-separated boolean table from a predicate
    fn bool_table(selected: impl Fn(Position) -> bool) -> String {
        let mut out = String::from("\n");
        for c in 1..=COLUMNS {
            out.push('\t');
            out.push_str(&std::format!("{}", c));
        }
        out.push('\n');
        for r in 0..ROWS as u8 {
            out.push((b'A' + r) as char);
            for c in 0..COLUMNS as u8 {
                let p = Position::new(r, c).unwrap();
                out.push('\t');
                out.push_str(if selected(p) { "TRUE" } else { "FALSE" });
            }
            out.push('\n');
        }
        out
    }

    fn pos(s: &str) -> Position {
        Position::parse(s).unwrap()
    }

    #[test]
    fn test_selection_is_column_major() {
        let table = bool_table(|p| p.column() < 2 || (p.column() == 2 && p.row() < 4));
        let grid = parse_grid(&table).unwrap();
        grid.check_fill(FillRule::ColumnContiguous).unwrap();

        let selection = grid.selection();
        assert_eq!(selection.len(), 20);
        assert_eq!(selection[0], pos("A1"));
        assert_eq!(selection[1], pos("B1"));
        assert_eq!(selection[8], pos("A2"));
        assert_eq!(selection[19], pos("D3"));
    }

    #[test]
    fn test_single_well_selection() {
        let table = bool_table(|p| p == Position::A1);
        let grid = parse_grid(&table).unwrap();
        assert_eq!(grid.selection().as_slice(), &[Position::A1]);
    }

    #[test]
    fn test_empty_selection_is_valid() {
        let grid = parse_grid(&bool_table(|_| false)).unwrap();
        assert!(grid.selection().is_empty());
        assert!(grid.check_fill(FillRule::ColumnContiguous).is_ok());
    }

    #[test]
    fn test_column_gap_rejected() {
        // Column 2 only half filled, column 3 has a filled cell
        let table = bool_table(|p| p.column() == 0 || (p.column() == 1 && p.row() < 4) || p == pos("A3"));
        let grid = parse_grid(&table).unwrap();
        assert_eq!(
            grid.check_fill(FillRule::ColumnContiguous),
            Err(GridError::NotColumnContiguous {
                gap: pos("E2"),
                filled: pos("A3"),
            })
        );
        assert!(grid.check_fill(FillRule::Sparse).is_ok());
    }

    #[test]
    fn test_gap_within_column_rejected() {
        let table = bool_table(|p| p == pos("A1") || p == pos("C1"));
        let grid = parse_grid(&table).unwrap();
        assert_eq!(
            grid.check_fill(FillRule::ColumnContiguous),
            Err(GridError::NotColumnContiguous {
                gap: pos("B1"),
                filled: pos("C1"),
            })
        );
    }

    #[test]
    fn test_sparse_pooling_layout() {
        let table = bool_table(|p| p.column() % 2 == 1 && p.column() < 10);
        let grid = parse_grid(&table).unwrap();
        assert!(grid.check_fill(FillRule::ColumnContiguous).is_err());
        assert!(grid.check_fill(FillRule::Sparse).is_ok());
        let selection = grid.selection();
        assert_eq!(selection.len(), 40);
        assert_eq!(selection[0], pos("A2"));
        assert_eq!(selection[8], pos("A4"));
    }

    #[test]
    fn test_volume_table_with_blanks() {
        let table = "\n\t1\t2\t3\t4\t5\t6\t7\t8\t9\t10\t11\t12\n\
                     A\t12.4\t11.6\t\t\t\t\t\t\t\t\t\t\n\
                     B\t11.7\t10.7\t\t\t\t\t\t\t\t\t\t\n\
                     C\t12.2\t\t\t\t\t\t\t\t\t\t\t\n";
        let grid = parse_grid(table).unwrap();
        let volumes = grid.volumes();
        let expected: StdVec<(Position, Volume)> = StdVec::from([
            (pos("A1"), Volume::from_centi_ul(1240)),
            (pos("B1"), Volume::from_centi_ul(1170)),
            (pos("C1"), Volume::from_centi_ul(1220)),
            (pos("A2"), Volume::from_centi_ul(1160)),
            (pos("B2"), Volume::from_centi_ul(1070)),
        ]);
        assert_eq!(volumes.as_slice(), expected.as_slice());
        // Column 1 is not full before column 2 starts
        assert!(grid.check_fill(FillRule::ColumnContiguous).is_err());
    }

    #[test]
    fn test_zero_volume_is_mapped_but_not_selected() {
        let table = ",1,2\nA,0,5\n";
        let grid = parse_grid(table).unwrap();
        assert_eq!(grid.volumes().len(), 2);
        assert_eq!(grid.selection().as_slice(), &[pos("A2")]);
    }

    #[test]
    fn test_comma_and_tab_delimiters_mix() {
        let table = "\t1,2\nA,TRUE\tTRUE\nB\ttrue,False\n";
        let grid = parse_grid(table).unwrap();
        assert_eq!(grid.selection().as_slice(), &[pos("A1"), pos("B1"), pos("A2")]);
    }

    #[test]
    fn test_partial_header_and_missing_rows() {
        let grid = parse_grid("\t3\nB\tTRUE\n").unwrap();
        assert_eq!(grid.selection().as_slice(), &[pos("B3")]);
    }

    #[test]
    fn test_invalid_row_label() {
        let table = "\t1\t2\nI\tTRUE\tFALSE\n";
        assert_eq!(parse_grid(table), Err(GridError::InvalidRow { line: 2 }));
        assert_eq!(
            parse_grid("\t1\nAB\tTRUE\n"),
            Err(GridError::InvalidRow { line: 2 })
        );
    }

    #[test]
    fn test_invalid_column_header() {
        assert_eq!(parse_grid("\t1\t13\nA\tTRUE\n"), Err(GridError::InvalidColumn { line: 1 }));
        assert_eq!(parse_grid("\t0\nA\tTRUE\n"), Err(GridError::InvalidColumn { line: 1 }));
        assert_eq!(parse_grid("\tx\nA\tTRUE\n"), Err(GridError::InvalidColumn { line: 1 }));
        assert_eq!(parse_grid("A\t1\n"), Err(GridError::InvalidColumn { line: 1 }));
        assert_eq!(
            parse_grid("\t1\t1\nA\tTRUE\n"),
            Err(GridError::DuplicateColumn { column: 1 })
        );
    }

    #[test]
    fn test_duplicate_row() {
        assert_eq!(
            parse_grid("\t1\nA\tTRUE\nA\tFALSE\n"),
            Err(GridError::DuplicateRow { row: 'A' })
        );
    }

    #[test]
    fn test_bad_cells() {
        assert_eq!(
            parse_grid("\t1\t2\nA\tyes\tTRUE\n"),
            Err(GridError::InvalidCell { position: pos("A1") })
        );
        assert_eq!(
            parse_grid("\t1\nA\t-3\n"),
            Err(GridError::InvalidCell { position: pos("A1") })
        );
        assert_eq!(
            parse_grid("\t1\nA\tTRUE\tTRUE\n"),
            Err(GridError::UnexpectedCell { line: 2 })
        );
        assert_eq!(
            parse_grid("\t1\t2\nA\tTRUE\t4.5\n"),
            Err(GridError::MixedCells { position: pos("A2") })
        );
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(parse_grid(""), Err(GridError::MissingHeader));
        assert_eq!(parse_grid("\n  \n"), Err(GridError::MissingHeader));
    }

    proptest! {
        #[test]
        fn prop_prefix_selection_round_trips(n in 0usize..=WELL_COUNT) {
            let table = bool_table(|p| p.index() < n);
            let grid = parse_grid(&table).unwrap();
            prop_assert!(grid.check_fill(FillRule::ColumnContiguous).is_ok());
            let selection = grid.selection();
            prop_assert_eq!(selection.len(), n);
            for (i, p) in selection.iter().enumerate() {
                prop_assert_eq!(p.index(), i);
            }
        }

        #[test]
        fn prop_non_prefix_rejected(mask in proptest::collection::vec(any::<bool>(), WELL_COUNT)) {
            let table = bool_table(|p| mask[p.index()]);
            let grid = parse_grid(&table).unwrap();
            let count = mask.iter().filter(|&&m| m).count();
            let is_prefix = mask.iter().take(count).all(|&m| m);
            prop_assert_eq!(grid.check_fill(FillRule::ColumnContiguous).is_ok(), is_prefix);
        }
    }
}
