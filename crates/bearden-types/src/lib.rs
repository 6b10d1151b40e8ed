//! Shared type definitions for the Bearden simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Bearden workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the drawing surface.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`grid`] -- Grid coordinates, cell states, extents, fine positions
//! - [`entities`] -- Entity records (bears, rooms, structures, connections)
//! - [`overlay`] -- Transient visuals (request/response tokens)

pub mod entities;
pub mod grid;
pub mod ids;
pub mod overlay;

// Re-export all public types at crate root for convenience.
pub use entities::{
    Bear, BearKind, BearPatch, Connection, Database, Decision, EntityRef, Honeypot, House,
    MoveTarget, MovementMode, Room,
};
pub use grid::{Cell, CellState, Extent, FinePos, MILLIS_PER_CELL};
pub use ids::{BearId, ConnectionId, DatabaseId, HoneypotId, HouseId, RoomId};
pub use overlay::{Token, TokenColor};
