//! Grid coordinates, cell states, extents, and fine positions.
//!
//! A [`Cell`] is a discrete `(row, col)` coordinate; a [`FinePos`] is an
//! interpolated position between cells. The grid itself lives in
//! `bearden-world`; these types are shared so that agents, the motion
//! engine, and the scene all speak the same coordinates.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A discrete grid coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Cell {
    /// Row index (0 at the top).
    pub row: usize,
    /// Column index (0 at the left).
    pub col: usize,
}

impl Cell {
    /// Create a cell from row and column indices.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Whether `other` is exactly one step away in one of the four
    /// cardinal directions.
    pub const fn is_adjacent(&self, other: &Self) -> bool {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        (dr == 1 && dc == 0) || (dr == 0 && dc == 1)
    }
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The occupancy state of a single grid cell.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CellState {
    /// Open floor; walkable.
    #[default]
    Empty,
    /// A wall segment; impassable.
    Wall,
    /// A doorway; walkable, and crossing one may require clearance.
    Door,
}

impl CellState {
    /// Whether an agent can stand on or move through this cell.
    ///
    /// Everything except a wall is walkable.
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// Fixed-point subdivisions of one cell used for interpolated positions.
pub const MILLIS_PER_CELL: i64 = 1000;

/// An interpolated position in thousandths of a cell.
///
/// While a bear is mid-animation its true visual position lives between
/// cells. Fixed-point integers keep the interpolation arithmetic checked
/// and exactly reproducible; [`FinePos::nearest_cell`] rounds back onto
/// the grid when the position must become authoritative again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct FinePos {
    /// Row position in millicells.
    pub row_milli: i64,
    /// Column position in millicells.
    pub col_milli: i64,
}

impl FinePos {
    /// The fine position at the center of a cell.
    pub fn from_cell(cell: Cell) -> Self {
        let row = i64::try_from(cell.row).unwrap_or(i64::MAX);
        let col = i64::try_from(cell.col).unwrap_or(i64::MAX);
        Self {
            row_milli: row.saturating_mul(MILLIS_PER_CELL),
            col_milli: col.saturating_mul(MILLIS_PER_CELL),
        }
    }

    /// The grid cell closest to this position.
    pub fn nearest_cell(&self) -> Cell {
        let half = MILLIS_PER_CELL.saturating_div(2);
        let row = self
            .row_milli
            .saturating_add(half)
            .saturating_div(MILLIS_PER_CELL)
            .max(0);
        let col = self
            .col_milli
            .saturating_add(half)
            .saturating_div(MILLIS_PER_CELL)
            .max(0);
        Cell::new(
            usize::try_from(row).unwrap_or(usize::MAX),
            usize::try_from(col).unwrap_or(usize::MAX),
        )
    }

    /// Linear interpolation between two positions.
    ///
    /// `elapsed` is clamped into `0..=total`; a zero `total` snaps to the
    /// end position.
    pub fn lerp(from: Self, to: Self, elapsed: u64, total: u64) -> Self {
        if total == 0 || elapsed >= total {
            return to;
        }
        let t_num = i128::from(elapsed);
        let t_den = i128::from(total);
        let interp = |a: i64, b: i64| -> i64 {
            let delta = i128::from(b).saturating_sub(i128::from(a));
            let offset = delta.saturating_mul(t_num).saturating_div(t_den);
            let value = i128::from(a).saturating_add(offset);
            i64::try_from(value).unwrap_or(i64::MAX)
        };
        Self {
            row_milli: interp(from.row_milli, to.row_milli),
            col_milli: interp(from.col_milli, to.col_milli),
        }
    }
}

/// An inclusive rectangular region of cells.
///
/// Used to describe the footprint of multi-cell structures when picking
/// connection endpoints and suppressing structure footprints in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Extent {
    /// Smallest row in the region.
    pub row_min: usize,
    /// Largest row in the region (inclusive).
    pub row_max: usize,
    /// Smallest column in the region.
    pub col_min: usize,
    /// Largest column in the region (inclusive).
    pub col_max: usize,
}

impl Extent {
    /// The extent covering exactly one cell.
    pub const fn single(cell: Cell) -> Self {
        Self {
            row_min: cell.row,
            row_max: cell.row,
            col_min: cell.col,
            col_max: cell.col,
        }
    }

    /// Whether the given cell falls inside this extent (inclusive).
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.row >= self.row_min
            && cell.row <= self.row_max
            && cell.col >= self.col_min
            && cell.col <= self.col_max
    }

    /// The bottom-left corner cell.
    pub const fn bottom_left(&self) -> Cell {
        Cell::new(self.row_max, self.col_min)
    }

    /// The bottom-right corner cell.
    pub const fn bottom_right(&self) -> Cell {
        Cell::new(self.row_max, self.col_max)
    }

    /// Whether this extent lies entirely to the left of `other`
    /// (no column overlap).
    pub const fn is_fully_left_of(&self, other: &Self) -> bool {
        self.col_max < other.col_min
    }
}
