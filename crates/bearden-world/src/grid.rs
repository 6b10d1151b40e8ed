//! The occupancy grid.
//!
//! A [`Grid`] is a fixed-size rectangular array of [`CellState`]s sized to
//! cover the rendering viewport. It is mutated in place by placement
//! operations and read by pathfinding and the scene projection. The grid
//! is exclusively owned by the simulation state; every other component
//! works with read-only borrows or plain coordinates.

use bearden_types::{Cell, CellState};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// How many random picks the position helpers make before falling back
/// to a deterministic scan.
const MAX_RANDOM_PICKS: usize = 128;

/// A fixed-size rectangular occupancy grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
}

impl Grid {
    /// Create an all-empty grid with the given dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either dimension is
    /// zero, or [`WorldError::ArithmeticOverflow`] if the cell count
    /// overflows.
    pub fn new(rows: usize, cols: usize) -> Result<Self, WorldError> {
        if rows == 0 || cols == 0 {
            return Err(WorldError::InvalidDimensions { rows, cols });
        }
        let len = rows
            .checked_mul(cols)
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(Self {
            rows,
            cols,
            cells: vec![CellState::Empty; len],
        })
    }

    /// Number of rows.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the cell lies inside the grid.
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    fn index_of(&self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        cell.row.checked_mul(self.cols)?.checked_add(cell.col)
    }

    /// Read the state of a cell, or `None` when out of bounds.
    pub fn get(&self, cell: Cell) -> Option<CellState> {
        let idx = self.index_of(cell)?;
        self.cells.get(idx).copied()
    }

    /// Write the state of a cell.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] when the cell is outside the
    /// grid.
    pub fn set(&mut self, cell: Cell, state: CellState) -> Result<(), WorldError> {
        let idx = self.index_of(cell).ok_or(WorldError::OutOfBounds(cell))?;
        let slot = self.cells.get_mut(idx).ok_or(WorldError::OutOfBounds(cell))?;
        *slot = state;
        Ok(())
    }

    /// Whether an agent can stand on or move through the cell.
    ///
    /// Out-of-bounds cells are not walkable; in-bounds cells are walkable
    /// unless they hold a wall.
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.get(cell).is_some_and(CellState::is_walkable)
    }

    /// Reset every cell back to [`CellState::Empty`].
    pub fn reset(&mut self) {
        for slot in &mut self.cells {
            *slot = CellState::Empty;
        }
    }

    /// Iterate over all cells with their states, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, CellState)> + '_ {
        self.cells.iter().enumerate().map(|(idx, state)| {
            let row = idx.checked_div(self.cols).unwrap_or_default();
            let col = idx.checked_rem(self.cols).unwrap_or_default();
            (Cell::new(row, col), *state)
        })
    }

    /// A uniformly random cell, walkable or not.
    pub fn random_position(&self, rng: &mut impl Rng) -> Cell {
        let row = rng.random_range(0..self.rows);
        let col = rng.random_range(0..self.cols);
        Cell::new(row, col)
    }

    /// A random cell a bear can stand on (anything but a wall).
    ///
    /// Returns `None` only when the grid has no walkable cell at all.
    pub fn random_standing_position(&self, rng: &mut impl Rng) -> Option<Cell> {
        for _ in 0..MAX_RANDOM_PICKS {
            let cell = self.random_position(rng);
            if self.is_walkable(cell) {
                return Some(cell);
            }
        }
        // Dense grids can defeat random picks; scan for any opening.
        self.iter()
            .find(|(_, state)| state.is_walkable())
            .map(|(cell, _)| cell)
    }

    /// A random walkable cell on the grid perimeter (first or last row,
    /// first or last column).
    ///
    /// Returns `None` only when the entire perimeter is walled.
    pub fn random_perimeter_position(&self, rng: &mut impl Rng) -> Option<Cell> {
        let last_row = self.rows.saturating_sub(1);
        let last_col = self.cols.saturating_sub(1);
        for _ in 0..MAX_RANDOM_PICKS {
            let row = rng.random_range(0..self.rows);
            let col = if row == 0 || row == last_row {
                rng.random_range(0..self.cols)
            } else if rng.random_bool(0.5) {
                0
            } else {
                last_col
            };
            let cell = Cell::new(row, col);
            if self.is_walkable(cell) {
                return Some(cell);
            }
        }
        self.iter()
            .find(|(cell, state)| {
                state.is_walkable()
                    && (cell.row == 0
                        || cell.row == last_row
                        || cell.col == 0
                        || cell.col == last_col)
            })
            .map(|(cell, _)| cell)
    }
}
