//! Occupancy grid, procedural placement, and pathfinding for the Bearden
//! simulation.
//!
//! This crate models the physical world: a fixed-size grid of cells, the
//! procedural room planner with its retry/backoff rules, fixed-footprint
//! structures (houses and databases), and breadth-first pathfinding with
//! a bounded retry wrapper.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid operations.
//! - [`grid`] -- The occupancy grid and random position helpers.
//! - [`rooms`] -- Procedural room placement with margin validation and
//!   per-side door punching.
//! - [`structures`] -- House/database stamping, door coordinates, and
//!   extent helpers for occlusion.
//! - [`pathfind`] -- BFS shortest paths and the bounded retry wrapper.

pub mod error;
pub mod grid;
pub mod pathfind;
pub mod rooms;
pub mod structures;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use grid::Grid;
pub use pathfind::{PathConfig, find_anchor_path, find_path, search_path};
pub use rooms::{RoomConfig, RoomPlanner};
pub use structures::{
    DATABASE_SIZE, HOUSE_SIZE, database_extent, house_door_coords, house_extent,
    is_in_any_database, is_in_any_house, place_database, place_house,
};
