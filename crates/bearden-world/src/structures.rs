//! Fixed-footprint structures: houses and databases.
//!
//! Structures are stamped at caller-supplied positions with no retry.
//! A house is 4x4 with a single door at a fixed offset; a database is
//! 2x2 and has no door. The scene suppresses the stamped walls inside a
//! structure's extent in favor of an icon, so extent helpers live here
//! too.

use bearden_types::{Cell, CellState, Database, Extent, House};

use crate::error::WorldError;
use crate::grid::Grid;

/// Width and height of a house footprint, in cells.
pub const HOUSE_SIZE: usize = 4;

/// Width and height of a database footprint, in cells.
pub const DATABASE_SIZE: usize = 2;

/// Row offset of the house door relative to the house anchor.
const HOUSE_DOOR_ROW_OFFSET: usize = 3;

/// Column offset of the house door relative to the house anchor.
const HOUSE_DOOR_COL_OFFSET: usize = 2;

/// The door cell of a house anchored at `pos`.
///
/// Saturating arithmetic is fine here: the footprint is bounds-checked
/// at placement time, long before anyone asks for the door.
pub const fn house_door_coords(pos: Cell) -> Cell {
    Cell::new(
        pos.row.saturating_add(HOUSE_DOOR_ROW_OFFSET),
        pos.col.saturating_add(HOUSE_DOOR_COL_OFFSET),
    )
}

/// The inclusive extent of a house anchored at `pos`.
pub const fn house_extent(pos: Cell) -> Extent {
    Extent {
        row_min: pos.row,
        row_max: pos.row.saturating_add(HOUSE_SIZE - 1),
        col_min: pos.col,
        col_max: pos.col.saturating_add(HOUSE_SIZE - 1),
    }
}

/// The inclusive extent of a database anchored at `pos`.
pub const fn database_extent(pos: Cell) -> Extent {
    Extent {
        row_min: pos.row,
        row_max: pos.row.saturating_add(DATABASE_SIZE - 1),
        col_min: pos.col,
        col_max: pos.col.saturating_add(DATABASE_SIZE - 1),
    }
}

/// Whether the cell falls inside any of the given houses' extents.
pub fn is_in_any_house(houses: &[House], cell: Cell) -> bool {
    houses
        .iter()
        .any(|house| house_extent(house.pos).contains(cell))
}

/// Whether the cell falls inside any of the given databases' extents.
pub fn is_in_any_database(databases: &[Database], cell: Cell) -> bool {
    databases
        .iter()
        .any(|db| database_extent(db.pos).contains(cell))
}

/// Stamp a house at `pos`: perimeter walls, empty interior, and the door
/// at its fixed offset.
///
/// Either the whole footprint commits or, when it does not fit, the grid
/// is left untouched.
///
/// # Errors
///
/// Returns [`WorldError::FootprintOutOfBounds`] when the 4x4 footprint
/// does not fit inside the grid.
pub fn place_house(grid: &mut Grid, pos: Cell) -> Result<(), WorldError> {
    stamp_footprint(grid, pos, HOUSE_SIZE, HOUSE_SIZE)?;
    grid.set(house_door_coords(pos), CellState::Door)
}

/// Stamp a database at `pos`. The 2x2 footprint is all perimeter, so the
/// whole block becomes walls; there is no door.
///
/// # Errors
///
/// Returns [`WorldError::FootprintOutOfBounds`] when the 2x2 footprint
/// does not fit inside the grid.
pub fn place_database(grid: &mut Grid, pos: Cell) -> Result<(), WorldError> {
    stamp_footprint(grid, pos, DATABASE_SIZE, DATABASE_SIZE)
}

/// Stamp a rectangular footprint: perimeter walls, empty interior.
/// Validates the whole footprint before the first write.
fn stamp_footprint(
    grid: &mut Grid,
    pos: Cell,
    width: usize,
    height: usize,
) -> Result<(), WorldError> {
    let oob = WorldError::FootprintOutOfBounds { pos, width, height };

    let Some(row_end) = pos.row.checked_add(height) else {
        return Err(oob);
    };
    let Some(col_end) = pos.col.checked_add(width) else {
        return Err(oob);
    };
    if row_end > grid.rows() || col_end > grid.cols() {
        return Err(oob);
    }
    let last_row = row_end.saturating_sub(1);
    let last_col = col_end.saturating_sub(1);

    for row in pos.row..row_end {
        for col in pos.col..col_end {
            let on_perimeter =
                row == pos.row || row == last_row || col == pos.col || col == last_col;
            let state = if on_perimeter {
                CellState::Wall
            } else {
                CellState::Empty
            };
            grid.set(Cell::new(row, col), state)?;
        }
    }
    Ok(())
}
