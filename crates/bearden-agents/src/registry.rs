//! The authoritative entity registry.
//!
//! One [`Registry`] instance owns the tables for bears, rooms, houses,
//! databases, honeypots, and connections. Identifiers are typed, so
//! generic lookups dispatch on the [`EntityRef`] tag instead of
//! inspecting id strings. Tables are keyed by UUID v7 ids, which sort in
//! creation order -- iteration order is spawn order.

use std::collections::BTreeMap;

use bearden_types::{
    Bear, BearId, BearPatch, Cell, CellState, Connection, ConnectionId, Database, DatabaseId,
    EntityRef, Extent, Honeypot, HoneypotId, House, HouseId, Room, RoomId,
};
use bearden_world::{Grid, database_extent, house_extent};
use rand::Rng;
use tracing::debug;

use crate::error::AgentError;

/// How many random picks honeypot placement makes before falling back to
/// a deterministic scan.
const MAX_RANDOM_PICKS: usize = 128;

/// A borrowed view of any entity, produced by generic lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entity<'a> {
    /// A bear.
    Bear(&'a Bear),
    /// A house.
    House(&'a House),
    /// A database.
    Database(&'a Database),
    /// A honeypot.
    Honeypot(&'a Honeypot),
    /// A connection.
    Connection(&'a Connection),
}

/// The authoritative in-memory table of all entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    bears: BTreeMap<BearId, Bear>,
    rooms: BTreeMap<RoomId, Room>,
    houses: BTreeMap<HouseId, House>,
    databases: BTreeMap<DatabaseId, Database>,
    honeypots: BTreeMap<HoneypotId, Honeypot>,
    connections: BTreeMap<ConnectionId, Connection>,
}

impl Registry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            bears: BTreeMap::new(),
            rooms: BTreeMap::new(),
            houses: BTreeMap::new(),
            databases: BTreeMap::new(),
            honeypots: BTreeMap::new(),
            connections: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Bears
    // -------------------------------------------------------------------

    /// Insert a bear. Returns its id.
    pub fn add_bear(&mut self, bear: Bear) -> BearId {
        let id = bear.id;
        self.bears.insert(id, bear);
        id
    }

    /// Remove a bear. Removing an id that is not present is a no-op.
    pub fn remove_bear(&mut self, id: BearId) -> Option<Bear> {
        let removed = self.bears.remove(&id);
        if removed.is_none() {
            debug!(%id, "remove_bear: id not present, ignoring");
        }
        removed
    }

    /// Look up a bear.
    pub fn bear(&self, id: BearId) -> Option<&Bear> {
        self.bears.get(&id)
    }

    /// Look up a bear mutably.
    pub fn bear_mut(&mut self, id: BearId) -> Option<&mut Bear> {
        self.bears.get_mut(&id)
    }

    /// Merge a partial update into a bear. Returns `false` when the bear
    /// does not exist.
    pub fn update_bear(&mut self, id: BearId, patch: BearPatch) -> bool {
        let Some(bear) = self.bears.get_mut(&id) else {
            return false;
        };
        if let Some(name) = patch.name {
            bear.name = name;
        }
        if let Some(pos) = patch.pos {
            bear.pos = pos;
        }
        if let Some(hunger) = patch.hunger {
            bear.hunger = hunger;
        }
        if let Some(movement) = patch.movement {
            bear.movement = movement;
        }
        if let Some(target) = patch.target {
            bear.target = target;
        }
        true
    }

    /// Iterate over all bears in spawn order.
    pub fn bears(&self) -> impl Iterator<Item = &Bear> {
        self.bears.values()
    }

    /// Number of live bears.
    pub fn bear_count(&self) -> usize {
        self.bears.len()
    }

    // -------------------------------------------------------------------
    // Rooms
    // -------------------------------------------------------------------

    /// Insert a room record.
    pub fn add_room(&mut self, room: Room) -> RoomId {
        let id = room.id;
        self.rooms.insert(id, room);
        id
    }

    /// Iterate over all rooms in placement order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Find a room by its name.
    pub fn room_by_name(&self, name: &str) -> Option<&Room> {
        self.rooms
            .values()
            .find(|room| room.name.as_deref() == Some(name))
    }

    // -------------------------------------------------------------------
    // Structures and honeypots
    // -------------------------------------------------------------------

    /// Insert a house record.
    pub fn add_house(&mut self, house: House) -> HouseId {
        let id = house.id;
        self.houses.insert(id, house);
        id
    }

    /// Look up a house.
    pub fn house(&self, id: HouseId) -> Option<&House> {
        self.houses.get(&id)
    }

    /// Iterate over all houses in placement order.
    pub fn houses(&self) -> impl Iterator<Item = &House> {
        self.houses.values()
    }

    /// Insert a database record.
    pub fn add_database(&mut self, database: Database) -> DatabaseId {
        let id = database.id;
        self.databases.insert(id, database);
        id
    }

    /// Look up a database.
    pub fn database(&self, id: DatabaseId) -> Option<&Database> {
        self.databases.get(&id)
    }

    /// Iterate over all databases in placement order.
    pub fn databases(&self) -> impl Iterator<Item = &Database> {
        self.databases.values()
    }

    /// Insert a honeypot record.
    pub fn add_honeypot(&mut self, honeypot: Honeypot) -> HoneypotId {
        let id = honeypot.id;
        self.honeypots.insert(id, honeypot);
        id
    }

    /// The oldest honeypot, if any. Hungry wanderers head here.
    pub fn first_honeypot(&self) -> Option<&Honeypot> {
        self.honeypots.values().next()
    }

    /// Iterate over all honeypots in placement order.
    pub fn honeypots(&self) -> impl Iterator<Item = &Honeypot> {
        self.honeypots.values()
    }

    /// Place a honeypot, preferring the interior of the named room.
    ///
    /// Falls back to a random empty, honeypot-free cell when the room is
    /// missing or full. Returns `None` when the grid has no such cell at
    /// all -- an expected empty outcome.
    pub fn place_honeypot(
        &mut self,
        grid: &Grid,
        preferred_room: Option<&str>,
        rng: &mut impl Rng,
    ) -> Option<Honeypot> {
        let in_room = preferred_room
            .and_then(|name| self.room_by_name(name))
            .and_then(|room| self.find_empty_cell_in_room(grid, room));

        let pos = match in_room {
            Some(cell) => cell,
            None => self.random_free_cell(grid, rng)?,
        };

        let honeypot = Honeypot {
            id: HoneypotId::new(),
            pos,
        };
        self.add_honeypot(honeypot);
        Some(honeypot)
    }

    /// The first interior cell of a room that is empty and not already
    /// occupied by a honeypot.
    pub fn find_empty_cell_in_room(&self, grid: &Grid, room: &Room) -> Option<Cell> {
        let row_end = room.origin.row.checked_add(room.height)?;
        let col_end = room.origin.col.checked_add(room.width)?;
        for row in room.origin.row..row_end {
            for col in room.origin.col..col_end {
                let cell = Cell::new(row, col);
                if grid.get(cell) == Some(CellState::Empty)
                    && !self.honeypots.values().any(|h| h.pos == cell)
                {
                    return Some(cell);
                }
            }
        }
        None
    }

    fn random_free_cell(&self, grid: &Grid, rng: &mut impl Rng) -> Option<Cell> {
        for _ in 0..MAX_RANDOM_PICKS {
            let cell = grid.random_position(rng);
            if grid.get(cell) == Some(CellState::Empty)
                && !self.honeypots.values().any(|h| h.pos == cell)
            {
                return Some(cell);
            }
        }
        grid.iter()
            .find(|(cell, state)| {
                *state == CellState::Empty
                    && !self.honeypots.values().any(|h| h.pos == *cell)
            })
            .map(|(cell, _)| cell)
    }

    // -------------------------------------------------------------------
    // Connections
    // -------------------------------------------------------------------

    /// Create an undirected connection between two entities.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnknownEntity`] when either endpoint does
    /// not resolve to a live entity, or
    /// [`AgentError::DuplicateConnection`] when the pair is already
    /// connected. Either way the registry is unchanged.
    pub fn add_connection(
        &mut self,
        src: EntityRef,
        dst: EntityRef,
    ) -> Result<Connection, AgentError> {
        if !self.contains(src) {
            return Err(AgentError::UnknownEntity(src));
        }
        if !self.contains(dst) {
            return Err(AgentError::UnknownEntity(dst));
        }
        if self.connection_between(src, dst).is_some() {
            return Err(AgentError::DuplicateConnection { src, dst });
        }
        let connection = Connection {
            id: ConnectionId::new(),
            src,
            dst,
        };
        self.connections.insert(connection.id, connection);
        Ok(connection)
    }

    /// Look up a connection by id.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// The connection linking two entities, in either direction.
    pub fn connection_between(&self, a: EntityRef, b: EntityRef) -> Option<&Connection> {
        self.connections.values().find(|conn| conn.links(a, b))
    }

    /// Iterate over all connections in creation order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    // -------------------------------------------------------------------
    // Generic lookup
    // -------------------------------------------------------------------

    /// Look up any entity by its typed reference.
    pub fn find(&self, entity: EntityRef) -> Option<Entity<'_>> {
        match entity {
            EntityRef::Bear(id) => self.bears.get(&id).map(Entity::Bear),
            EntityRef::House(id) => self.houses.get(&id).map(Entity::House),
            EntityRef::Database(id) => self.databases.get(&id).map(Entity::Database),
            EntityRef::Honeypot(id) => self.honeypots.get(&id).map(Entity::Honeypot),
            EntityRef::Connection(id) => self.connections.get(&id).map(Entity::Connection),
        }
    }

    /// Whether the referenced entity exists.
    pub fn contains(&self, entity: EntityRef) -> bool {
        self.find(entity).is_some()
    }

    /// The grid extent occupied by an entity, used for picking connection
    /// endpoints. Connections themselves have no extent.
    pub fn extent_of(&self, entity: EntityRef) -> Option<Extent> {
        match self.find(entity)? {
            Entity::Bear(bear) => Some(Extent::single(bear.pos)),
            Entity::House(house) => Some(house_extent(house.pos)),
            Entity::Database(db) => Some(database_extent(db.pos)),
            Entity::Honeypot(honeypot) => Some(Extent::single(honeypot.pos)),
            Entity::Connection(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bearden_types::{BearKind, MovementMode};
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn make_bear(pos: Cell) -> Bear {
        Bear {
            id: BearId::new(),
            kind: BearKind::Resident,
            name: String::from("Smokey"),
            pos,
            hunger: 0,
            movement: MovementMode::Wandering,
            target: None,
            created_at: Utc::now(),
        }
    }

    fn make_house(pos: Cell) -> House {
        House {
            id: HouseId::new(),
            pos,
        }
    }

    #[test]
    fn bear_lifecycle() {
        let mut registry = Registry::new();
        let bear = make_bear(Cell::new(1, 1));
        let id = registry.add_bear(bear);
        assert_eq!(registry.bear_count(), 1);

        assert!(registry.update_bear(
            id,
            BearPatch {
                hunger: Some(4),
                target: Some(None),
                ..BearPatch::default()
            }
        ));
        assert_eq!(registry.bear(id).map(|b| b.hunger), Some(4));

        assert!(registry.remove_bear(id).is_some());
        // Removing again is a silent no-op.
        assert!(registry.remove_bear(id).is_none());
        assert_eq!(registry.bear_count(), 0);
    }

    #[test]
    fn update_missing_bear_reports_false() {
        let mut registry = Registry::new();
        assert!(!registry.update_bear(BearId::new(), BearPatch::default()));
    }

    #[test]
    fn generic_lookup_dispatches_on_kind() {
        let mut registry = Registry::new();
        let bear_id = registry.add_bear(make_bear(Cell::new(0, 0)));
        let house_id = registry.add_house(make_house(Cell::new(5, 11)));

        assert!(matches!(
            registry.find(EntityRef::Bear(bear_id)),
            Some(Entity::Bear(_))
        ));
        assert!(matches!(
            registry.find(EntityRef::House(house_id)),
            Some(Entity::House(_))
        ));
        assert_eq!(registry.find(EntityRef::Bear(BearId::new())), None);
    }

    #[test]
    fn connection_requires_live_endpoints() {
        let mut registry = Registry::new();
        let house_id = registry.add_house(make_house(Cell::new(5, 11)));
        let missing = EntityRef::Database(DatabaseId::new());

        let result = registry.add_connection(EntityRef::House(house_id), missing);
        assert!(matches!(result, Err(AgentError::UnknownEntity(_))));
        assert_eq!(registry.connections().count(), 0);
    }

    #[test]
    fn connection_lookup_ignores_direction() {
        let mut registry = Registry::new();
        let house_id = registry.add_house(make_house(Cell::new(5, 11)));
        let db_id = registry.add_database(Database {
            id: DatabaseId::new(),
            pos: Cell::new(10, 21),
        });
        let house = EntityRef::House(house_id);
        let db = EntityRef::Database(db_id);

        assert!(registry.add_connection(house, db).is_ok());
        assert!(registry.connection_between(db, house).is_some());
        assert!(
            matches!(
                registry.add_connection(db, house),
                Err(AgentError::DuplicateConnection { .. })
            ),
            "reverse duplicate must be rejected"
        );
    }

    #[test]
    fn honeypot_prefers_named_room() {
        let Ok(mut grid) = Grid::new(25, 25) else {
            return;
        };
        let planner = bearden_world::RoomPlanner::default();
        let mut rng = SmallRng::seed_from_u64(21);
        let Some(room) =
            planner.place_room(&mut grid, Some(String::from("kitchen")), &mut rng)
        else {
            return;
        };
        let mut registry = Registry::new();
        let room_extent = Extent {
            row_min: room.origin.row,
            row_max: room.origin.row.saturating_add(room.height.saturating_sub(1)),
            col_min: room.origin.col,
            col_max: room.origin.col.saturating_add(room.width.saturating_sub(1)),
        };
        registry.add_room(room);

        let Some(honeypot) = registry.place_honeypot(&grid, Some("kitchen"), &mut rng)
        else {
            assert!(false, "expected a honeypot placement");
            return;
        };
        assert!(room_extent.contains(honeypot.pos));
    }

    #[test]
    fn honeypot_falls_back_to_random_cell() {
        let Ok(grid) = Grid::new(10, 10) else {
            return;
        };
        let mut registry = Registry::new();
        let mut rng = SmallRng::seed_from_u64(22);
        let honeypot = registry.place_honeypot(&grid, Some("pantry"), &mut rng);
        assert!(honeypot.is_some());
    }

    #[test]
    fn extent_of_house_and_bear() {
        let mut registry = Registry::new();
        let bear_id = registry.add_bear(make_bear(Cell::new(2, 3)));
        let house_id = registry.add_house(make_house(Cell::new(5, 11)));

        assert_eq!(
            registry.extent_of(EntityRef::Bear(bear_id)),
            Some(Extent::single(Cell::new(2, 3)))
        );
        let house_ext = registry.extent_of(EntityRef::House(house_id));
        assert_eq!(
            house_ext,
            Some(Extent {
                row_min: 5,
                row_max: 8,
                col_min: 11,
                col_max: 14
            })
        );
    }
}
