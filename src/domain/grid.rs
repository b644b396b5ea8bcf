//! Grid specification for fixed-slot atlas placement
//!
//! Sprites are assigned to slots in row-major order: slot `i` sits in row
//! `i / columns` and column `i % columns`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::GridDimensions;

/// Upper bound on `columns * rows`
pub const MAX_SLOTS: u64 = 65_536;

/// Grid errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("Grid must have at least one column and one row, got {columns}x{rows}")]
    Empty { columns: u32, rows: u32 },
    #[error("Grid {columns}x{rows} exceeds {max} slots")]
    TooManySlots { columns: u32, rows: u32, max: u64 },
}

/// Fixed grid dimensions plus the padding placed around and between cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
    /// Padding in pixels, applied before the first cell and after every cell
    pub padding: u32,
}

impl GridSpec {
    /// Create a new grid specification
    pub fn new(columns: u32, rows: u32, padding: u32) -> Self {
        GridSpec { columns, rows, padding }
    }

    /// Validate the grid specification
    pub fn validate(&self) -> Result<(), GridError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(GridError::Empty {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if self.columns as u64 * self.rows as u64 > MAX_SLOTS {
            return Err(GridError::TooManySlots {
                columns: self.columns,
                rows: self.rows,
                max: MAX_SLOTS,
            });
        }
        Ok(())
    }

    /// Number of slots in the grid
    pub fn capacity(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// (row, column) of a slot index
    pub fn slot_position(&self, index: usize) -> (usize, usize) {
        let columns = self.columns as usize;
        (index / columns, index % columns)
    }

    pub fn dimensions(&self) -> GridDimensions {
        GridDimensions {
            columns: self.columns,
            rows: self.rows,
        }
    }
}
