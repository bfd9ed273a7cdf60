//! Well positions on a 96-well plate

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rows per plate (A–H)
pub const ROWS: usize = 8;

/// Columns per plate (1–12)
pub const COLUMNS: usize = 12;

/// Wells per plate
pub const WELL_COUNT: usize = ROWS * COLUMNS;

/// A single well address
///
/// Rows and columns are stored zero-based. Field order makes the derived
/// ordering column-major: A1, B1, … H1, A2, … H12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    column: u8,
    row: u8,
}

impl Position {
    /// First well in column-major order
    pub const A1: Position = Position { column: 0, row: 0 };

    /// Create a position from zero-based row and column
    pub const fn new(row: u8, column: u8) -> Option<Self> {
        if (row as usize) < ROWS && (column as usize) < COLUMNS {
            Some(Self { column, row })
        } else {
            None
        }
    }

    /// Position at a column-major index (0 = A1, 8 = A2, 95 = H12)
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < WELL_COUNT {
            Some(Self {
                column: (index / ROWS) as u8,
                row: (index % ROWS) as u8,
            })
        } else {
            None
        }
    }

    /// Row A of a zero-based column
    pub const fn column_head(column: u8) -> Option<Self> {
        Self::new(0, column)
    }

    /// Parse a canonical address such as `"A1"` or `"H12"`
    pub fn parse(address: &str) -> Option<Self> {
        let bytes = address.as_bytes();
        let (&letter, digits) = bytes.split_first()?;
        let row = row_from_letter(letter)?;
        if digits.is_empty() || digits.len() > 2 || digits[0] == b'0' {
            return None;
        }
        let mut column: u8 = 0;
        for &d in digits {
            if !d.is_ascii_digit() {
                return None;
            }
            column = column * 10 + (d - b'0');
        }
        Self::new(row, column.checked_sub(1)?)
    }

    /// Column-major index
    pub const fn index(self) -> usize {
        self.column as usize * ROWS + self.row as usize
    }

    /// Zero-based row
    pub const fn row(self) -> u8 {
        self.row
    }

    /// Zero-based column
    pub const fn column(self) -> u8 {
        self.column
    }

    /// Row letter (`'A'`..=`'H'`)
    pub const fn row_letter(self) -> char {
        (b'A' + self.row) as char
    }

    /// One-based column number (1..=12)
    pub const fn column_number(self) -> u8 {
        self.column + 1
    }

    /// All positions in column-major order
    pub fn all() -> impl Iterator<Item = Position> {
        (0..WELL_COUNT).filter_map(Position::from_index)
    }
}

/// Convert an uppercase row letter to a zero-based row
pub(crate) fn row_from_letter(letter: u8) -> Option<u8> {
    if (b'A'..b'A' + ROWS as u8).contains(&letter) {
        Some(letter - b'A')
    } else {
        None
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.column_number())
    }
}
