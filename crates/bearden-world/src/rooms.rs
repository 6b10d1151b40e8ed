//! Procedural room placement.
//!
//! Rooms are random rectangles stamped onto the grid: perimeter walls,
//! empty interior, and up to one door per side. Placement retries a
//! bounded number of random origins and gives up quietly -- "no room
//! produced" is a normal outcome the caller must tolerate, not an error.

use bearden_types::{Cell, CellState, Room, RoomId};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};

use crate::grid::Grid;

/// Tunables for room generation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Minimum room width/height in cells, walls included.
    pub min_size: usize,
    /// Maximum room width/height in cells, walls included.
    pub max_size: usize,
    /// How many random origins to try before giving up.
    pub max_tries: u32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_size: 4,
            max_size: 6,
            max_tries: 10,
        }
    }
}

/// Places rooms onto a grid according to a [`RoomConfig`].
#[derive(Debug, Clone, Default)]
pub struct RoomPlanner {
    config: RoomConfig,
}

impl RoomPlanner {
    /// Create a planner with the given configuration.
    pub const fn new(config: RoomConfig) -> Self {
        Self { config }
    }

    /// Try to place a room of random size at a random clear origin.
    ///
    /// The room's bounding box expanded by a one-cell margin must be
    /// entirely empty (margin cells outside the grid are ignored). On
    /// success the room is stamped into the grid -- perimeter walls,
    /// empty interior, doors punched -- and returned. Returns `None`
    /// after exhausting the configured tries; the grid is untouched in
    /// that case.
    pub fn place_room(
        &self,
        grid: &mut Grid,
        name: Option<String>,
        rng: &mut impl Rng,
    ) -> Option<Room> {
        let width = rng.random_range(self.config.min_size..=self.config.max_size);
        let height = rng.random_range(self.config.min_size..=self.config.max_size);

        let Some(max_row) = grid.rows().checked_sub(height) else {
            info!(width, height, "grid too small for a room of this size");
            return None;
        };
        let Some(max_col) = grid.cols().checked_sub(width) else {
            info!(width, height, "grid too small for a room of this size");
            return None;
        };

        let mut origin = None;
        for attempt in 0..self.config.max_tries {
            let candidate = Cell::new(
                rng.random_range(0..=max_row),
                rng.random_range(0..=max_col),
            );
            if region_is_clear(grid, candidate, width, height) {
                origin = Some(candidate);
                break;
            }
            debug!(attempt, %candidate, "room origin rejected, retrying");
        }

        let Some(origin) = origin else {
            info!(
                tries = self.config.max_tries,
                "could not find a place for the new room"
            );
            return None;
        };

        let doors = pick_doors(grid, origin, width, height, rng);
        stamp_room(grid, origin, width, height, &doors)?;

        Some(Room {
            id: RoomId::new(),
            name,
            origin,
            width,
            height,
            doors,
        })
    }
}

/// Whether the room's bounding box plus a one-cell margin is entirely
/// empty. Margin cells that fall outside the grid are ignored.
fn region_is_clear(grid: &Grid, origin: Cell, width: usize, height: usize) -> bool {
    let row_lo = origin.row.saturating_sub(1);
    let col_lo = origin.col.saturating_sub(1);
    let Some(row_hi) = origin.row.checked_add(height) else {
        return false;
    };
    let Some(col_hi) = origin.col.checked_add(width) else {
        return false;
    };
    for row in row_lo..=row_hi {
        for col in col_lo..=col_hi {
            let cell = Cell::new(row, col);
            if grid.contains(cell) && grid.get(cell) != Some(CellState::Empty) {
                return false;
            }
        }
    }
    true
}

/// Pick at most one door per side, at a random offset along the wall.
///
/// A door is only kept when the cell just outside it is inside the grid
/// and empty; a side with no such opening is skipped, so a room can end
/// up with fewer than four doors.
fn pick_doors(
    grid: &Grid,
    origin: Cell,
    width: usize,
    height: usize,
    rng: &mut impl Rng,
) -> Vec<Cell> {
    let mut doors = Vec::new();

    let Some(inner_w) = width.checked_sub(2).filter(|w| *w >= 1) else {
        return doors;
    };
    let Some(inner_h) = height.checked_sub(2).filter(|h| *h >= 1) else {
        return doors;
    };
    let Some(bottom_row) = origin.row.checked_add(height.saturating_sub(1)) else {
        return doors;
    };
    let Some(right_col) = origin.col.checked_add(width.saturating_sub(1)) else {
        return doors;
    };

    let top_col = origin.col.saturating_add(rng.random_range(1..=inner_w));
    let bottom_col = origin.col.saturating_add(rng.random_range(1..=inner_w));
    let left_row = origin.row.saturating_add(rng.random_range(1..=inner_h));
    let right_row = origin.row.saturating_add(rng.random_range(1..=inner_h));

    let candidates = [
        // (door cell, cell just outside the room)
        (
            Cell::new(origin.row, top_col),
            origin.row.checked_sub(1).map(|r| Cell::new(r, top_col)),
        ),
        (
            Cell::new(bottom_row, bottom_col),
            bottom_row.checked_add(1).map(|r| Cell::new(r, bottom_col)),
        ),
        (
            Cell::new(left_row, origin.col),
            origin.col.checked_sub(1).map(|c| Cell::new(left_row, c)),
        ),
        (
            Cell::new(right_row, right_col),
            right_col.checked_add(1).map(|c| Cell::new(right_row, c)),
        ),
    ];

    for (door, outside) in candidates {
        let open = outside
            .is_some_and(|cell| grid.get(cell) == Some(CellState::Empty));
        if open {
            doors.push(door);
        }
    }
    doors
}

/// Stamp the room into the grid: walls on the perimeter, empty interior,
/// doors over their wall cells. Only called after validation, so the
/// writes cannot go out of bounds.
fn stamp_room(
    grid: &mut Grid,
    origin: Cell,
    width: usize,
    height: usize,
    doors: &[Cell],
) -> Option<()> {
    let row_end = origin.row.checked_add(height)?;
    let col_end = origin.col.checked_add(width)?;
    let last_row = row_end.checked_sub(1)?;
    let last_col = col_end.checked_sub(1)?;

    for row in origin.row..row_end {
        for col in origin.col..col_end {
            let on_perimeter = row == origin.row
                || row == last_row
                || col == origin.col
                || col == last_col;
            let state = if on_perimeter {
                CellState::Wall
            } else {
                CellState::Empty
            };
            grid.set(Cell::new(row, col), state).ok()?;
        }
    }

    for door in doors {
        grid.set(*door, CellState::Door).ok()?;
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn room_extent_clear(room: &Room, other: &Room) -> bool {
        let a_row_lo = room.origin.row.saturating_sub(1);
        let a_col_lo = room.origin.col.saturating_sub(1);
        let a_row_hi = room.origin.row.saturating_add(room.height);
        let a_col_hi = room.origin.col.saturating_add(room.width);

        let b_row_lo = other.origin.row;
        let b_col_lo = other.origin.col;
        let b_row_hi = other.origin.row.saturating_add(other.height.saturating_sub(1));
        let b_col_hi = other.origin.col.saturating_add(other.width.saturating_sub(1));

        a_row_hi < b_row_lo || b_row_hi < a_row_lo || a_col_hi < b_col_lo || b_col_hi < a_col_lo
    }

    #[test]
    fn placed_room_is_stamped() {
        let Ok(mut grid) = Grid::new(25, 25) else {
            return;
        };
        let planner = RoomPlanner::default();
        let mut rng = SmallRng::seed_from_u64(3);

        let Some(room) = planner.place_room(&mut grid, Some(String::from("kitchen")), &mut rng)
        else {
            // An empty 25x25 grid always has space for one room.
            assert!(false, "expected a room on an empty grid");
            return;
        };

        assert_eq!(room.name.as_deref(), Some("kitchen"));
        assert!(room.width >= 4 && room.width <= 6);
        assert!(room.height >= 4 && room.height <= 6);

        // Corners are walls; interior is empty.
        assert_eq!(grid.get(room.origin), Some(CellState::Wall));
        let interior = Cell::new(
            room.origin.row.saturating_add(1),
            room.origin.col.saturating_add(1),
        );
        assert_eq!(grid.get(interior), Some(CellState::Empty));

        // Every door sits on the grid and is a door cell.
        for door in &room.doors {
            assert_eq!(grid.get(*door), Some(CellState::Door));
        }
    }

    #[test]
    fn rooms_never_overlap() {
        let Ok(mut grid) = Grid::new(25, 25) else {
            return;
        };
        let planner = RoomPlanner::default();
        let mut rng = SmallRng::seed_from_u64(11);

        let mut rooms = Vec::new();
        for _ in 0..8 {
            if let Some(room) = planner.place_room(&mut grid, None, &mut rng) {
                rooms.push(room);
            }
        }
        assert!(!rooms.is_empty());

        for (i, a) in rooms.iter().enumerate() {
            for b in rooms.iter().skip(i.saturating_add(1)) {
                assert!(
                    room_extent_clear(a, b),
                    "rooms at {} and {} overlap",
                    a.origin,
                    b.origin
                );
            }
        }
    }

    #[test]
    fn full_grid_yields_no_room() {
        let Ok(mut grid) = Grid::new(25, 25) else {
            return;
        };
        // Wall the entire grid; no origin can validate.
        for row in 0..25 {
            for col in 0..25 {
                let _ = grid.set(Cell::new(row, col), CellState::Wall);
            }
        }
        let planner = RoomPlanner::default();
        let mut rng = SmallRng::seed_from_u64(5);
        assert!(planner.place_room(&mut grid, None, &mut rng).is_none());
    }

    #[test]
    fn edge_room_skips_blocked_sides() {
        // A grid exactly as tall as the room: top and bottom sides have
        // no outside cell, so neither can hold a door.
        let Ok(mut grid) = Grid::new(4, 25) else {
            return;
        };
        let planner = RoomPlanner::new(RoomConfig {
            min_size: 4,
            max_size: 4,
            max_tries: 10,
        });
        let mut rng = SmallRng::seed_from_u64(9);
        let Some(room) = planner.place_room(&mut grid, None, &mut rng) else {
            assert!(false, "expected a room");
            return;
        };
        for door in &room.doors {
            // Doors may only appear on the left or right walls here.
            assert!(
                door.col == room.origin.col
                    || door.col
                        == room
                            .origin
                            .col
                            .saturating_add(room.width.saturating_sub(1)),
                "unexpected door at {door}"
            );
        }
    }
}
