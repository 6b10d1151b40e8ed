//! Entity records: bears, rooms, structures, honeypots, and connections.
//!
//! These are plain data carriers. Lifecycle rules (who may create,
//! mutate, or remove them) live in `bearden-agents`; spatial rules live
//! in `bearden-world`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::grid::Cell;
use crate::ids::{BearId, ConnectionId, DatabaseId, HoneypotId, HouseId, RoomId};

/// What sort of bear this is.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BearKind {
    /// An ordinary bear that belongs in the world.
    #[default]
    Resident,
    /// An intruder that should be kept out of protected structures.
    Impostor,
}

/// How a bear's movement is driven.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MovementMode {
    /// The bear wanders on its own, picking new targets when a move ends.
    #[default]
    Wandering,
    /// An external caller drives the bear toward explicit targets.
    Controlled,
}

/// Where a bear is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MoveTarget {
    /// A concrete grid cell.
    Cell(Cell),
    /// A house; the house's door cell is the concrete destination, and
    /// arriving there means entering (and leaving the world).
    House(HouseId),
}

/// A mobile agent.
///
/// `pos` is the authoritative rest position and is only meaningful while
/// the bear is not mid-animation; during motion the engine tracks an
/// interpolated position and reconciles it back into `pos` on pause or
/// completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Bear {
    /// Unique identity, assigned at spawn.
    pub id: BearId,
    /// Resident or impostor.
    pub kind: BearKind,
    /// Display name, drawn from the name pools when not supplied.
    pub name: String,
    /// Authoritative rest position.
    pub pos: Cell,
    /// Hunger level; 0 means not hungry.
    pub hunger: u32,
    /// Whether the bear wanders or is externally driven.
    pub movement: MovementMode,
    /// Current destination, if any.
    pub target: Option<MoveTarget>,
    /// When the bear was spawned.
    pub created_at: DateTime<Utc>,
}

/// A partial update to a bear, applied by merge.
///
/// `None` fields leave the current value untouched. `target` is doubly
/// optional so a patch can explicitly clear the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearPatch {
    /// Replacement display name.
    pub name: Option<String>,
    /// Replacement rest position.
    pub pos: Option<Cell>,
    /// Replacement hunger level.
    pub hunger: Option<u32>,
    /// Replacement movement mode.
    pub movement: Option<MovementMode>,
    /// Replacement target (`Some(None)` clears it).
    pub target: Option<Option<MoveTarget>>,
}

/// A procedurally generated rectangular room stamped into the grid.
///
/// Immutable after generation; rooms are never individually removed
/// (the grid is reset wholesale instead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Room {
    /// Unique identity.
    pub id: RoomId,
    /// Name extracted from the fact that created the room, if any.
    pub name: Option<String>,
    /// Top-left cell of the room's bounding box.
    pub origin: Cell,
    /// Width in cells, including perimeter walls.
    pub width: usize,
    /// Height in cells, including perimeter walls.
    pub height: usize,
    /// Door cells punched into the perimeter (at most one per side).
    pub doors: Vec<Cell>,
}

/// A house: a fixed 4x4 structure with a single door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct House {
    /// Unique identity.
    pub id: HouseId,
    /// Top-left cell of the footprint.
    pub pos: Cell,
}

/// A database: a fixed 2x2 structure with no door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Database {
    /// Unique identity.
    pub id: DatabaseId,
    /// Top-left cell of the footprint.
    pub pos: Cell,
}

/// A static point of interest that hungry bears seek out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Honeypot {
    /// Unique identity.
    pub id: HoneypotId,
    /// The cell the honeypot sits on.
    pub pos: Cell,
}

/// A typed reference to any entity in the simulation.
///
/// The variant carries the entity's kind, so generic lookups dispatch on
/// the tag rather than sniffing string prefixes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EntityRef {
    /// A bear.
    Bear(BearId),
    /// A house.
    House(HouseId),
    /// A database.
    Database(DatabaseId),
    /// A honeypot.
    Honeypot(HoneypotId),
    /// A connection.
    Connection(ConnectionId),
}

/// An undirected logical edge between two entities, rendered as a
/// concrete path over the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Connection {
    /// Unique identity.
    pub id: ConnectionId,
    /// One endpoint.
    pub src: EntityRef,
    /// The other endpoint.
    pub dst: EntityRef,
}

impl Connection {
    /// Whether this connection links the two given entities, in either
    /// direction.
    pub fn links(&self, a: EntityRef, b: EntityRef) -> bool {
        (self.src == a || self.dst == a) && (self.src == b || self.dst == b)
    }
}

/// The outcome of an authorization check.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Decision {
    /// Whether the actor is allowed to proceed.
    pub authorized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_links_either_direction() {
        let house = EntityRef::House(HouseId::new());
        let db = EntityRef::Database(DatabaseId::new());
        let other = EntityRef::Bear(BearId::new());
        let conn = Connection {
            id: ConnectionId::new(),
            src: house,
            dst: db,
        };
        assert!(conn.links(house, db));
        assert!(conn.links(db, house));
        assert!(!conn.links(house, other));
    }

    #[test]
    fn bear_serde_roundtrip() {
        let bear = Bear {
            id: BearId::new(),
            kind: BearKind::Impostor,
            name: String::from("Pat"),
            pos: Cell::new(1, 1),
            hunger: 3,
            movement: MovementMode::Controlled,
            target: Some(MoveTarget::Cell(Cell::new(4, 5))),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&bear).ok();
        assert!(json.is_some());
        let back: Result<Bear, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(back.ok(), Some(bear));
    }
}
