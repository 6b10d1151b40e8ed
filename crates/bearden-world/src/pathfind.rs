//! Breadth-first pathfinding over the occupancy grid.
//!
//! [`find_path`] produces the shortest 4-directional cell path between
//! two cells, treating walls as impassable and doors as ordinary floor.
//! [`search_path`] wraps it with a bounded retry loop; the retries only
//! help callers that perturb the grid or the goal between attempts, but
//! the ceiling keeps every caller honest about giving up.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use bearden_types::Cell;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::grid::Grid;

/// Tunables for path searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// How many times [`search_path`] re-runs the search before giving up.
    pub max_tries: u32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self { max_tries: 10 }
    }
}

/// Find the shortest walkable path from `start` to `goal`, inclusive of
/// both endpoints.
///
/// Returns `None` when either endpoint is outside the grid or no
/// sequence of walkable 4-adjacent steps connects them. `start == goal`
/// yields the single-cell path; an empty path is never returned.
pub fn find_path(grid: &Grid, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
    bfs(grid, start, goal, false)
}

/// Like [`find_path`], but the goal cell may be blocked.
///
/// Connection endpoints sit on structure corner walls; their tokens ride
/// the path visually rather than walking it, so the final cell is exempt
/// from the walkability rule. Every intermediate cell still is walkable.
pub fn find_anchor_path(grid: &Grid, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
    bfs(grid, start, goal, true)
}

fn bfs(grid: &Grid, start: Cell, goal: Cell, allow_blocked_goal: bool) -> Option<Vec<Cell>> {
    if !grid.contains(start) || !grid.contains(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let mut visited: BTreeSet<Cell> = BTreeSet::new();
    let mut parent: BTreeMap<Cell, Cell> = BTreeMap::new();
    let mut queue: VecDeque<Cell> = VecDeque::new();

    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            break;
        }
        for next in neighbors(current) {
            let passable =
                grid.is_walkable(next) || (allow_blocked_goal && next == goal);
            if !passable || !visited.insert(next) {
                continue;
            }
            parent.insert(next, current);
            queue.push_back(next);
        }
    }

    if !parent.contains_key(&goal) {
        return None;
    }

    // Walk the predecessor chain back from the goal.
    let mut path = VecDeque::new();
    let mut current = goal;
    path.push_front(current);
    while let Some(&predecessor) = parent.get(&current) {
        path.push_front(predecessor);
        current = predecessor;
        if current == start {
            break;
        }
    }

    Some(path.into_iter().collect())
}

/// Run [`find_path`] up to `config.max_tries` times, returning the first
/// path found.
///
/// With an unchanged grid every attempt returns the same answer, so the
/// retries only matter to callers that mutate the grid or move the goal
/// between attempts. Exhaustion is logged and reported as `None` --
/// callers treat it as "the agent simply does not move".
pub fn search_path(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    config: PathConfig,
) -> Option<Vec<Cell>> {
    for attempt in 0..config.max_tries {
        if let Some(path) = find_path(grid, start, goal) {
            return Some(path);
        }
        debug!(attempt, %start, %goal, "no valid path found, trying again");
    }
    warn!(
        tries = config.max_tries,
        %start,
        %goal,
        "exhausted max tries for finding a path, giving up"
    );
    None
}

/// The 4-adjacent neighbors of a cell that stay inside index range.
/// Grid-boundary filtering happens at the walkability check.
fn neighbors(cell: Cell) -> impl Iterator<Item = Cell> {
    let up = cell.row.checked_sub(1).map(|row| Cell::new(row, cell.col));
    let down = cell.row.checked_add(1).map(|row| Cell::new(row, cell.col));
    let left = cell.col.checked_sub(1).map(|col| Cell::new(cell.row, col));
    let right = cell.col.checked_add(1).map(|col| Cell::new(cell.row, col));
    [up, down, left, right].into_iter().flatten()
}
