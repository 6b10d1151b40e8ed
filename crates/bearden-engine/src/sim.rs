//! The shared simulation state and its handle.
//!
//! One [`SimState`] owns the grid, the entity registry, and the
//! transient animation bookkeeping (fine positions, tokens, cached
//! connection paths). Components receive a cloned [`SimHandle`] rather
//! than reaching for globals; under the single-threaded cooperative
//! runtime the mutex is uncontended and exists to serialize access
//! across suspension points.
//!
//! The rule that keeps replanning sound: any computation that starts
//! from the grid (a path search, a retarget) locks the handle and reads
//! the state *at that instant* -- never a snapshot captured before an
//! await.

use std::collections::BTreeMap;
use std::sync::Arc;

use bearden_agents::Registry;
use bearden_types::{
    BearId, Cell, ConnectionId, EntityRef, FinePos, Token, TokenColor,
};
use bearden_world::{Grid, WorldError, find_anchor_path};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::EngineError;

/// Per-bear animation bookkeeping.
///
/// The generation counter is the cancellation token: starting or pausing
/// a motion bumps it, and any in-flight animation loop that notices a
/// newer generation stops without touching the bear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionSlot {
    /// Current interpolated position.
    pub fine: FinePos,
    /// Generation of the owning motion; bumped to interrupt.
    pub generation: u64,
    /// Whether a motion currently drives this slot.
    pub active: bool,
}

/// The complete mutable state of one simulation.
#[derive(Debug)]
pub struct SimState {
    /// The occupancy grid.
    pub grid: Grid,
    /// The authoritative entity tables.
    pub registry: Registry,
    /// Script-applied cell tints, keyed by cell.
    pub tints: BTreeMap<Cell, String>,
    tokens: BTreeMap<u64, Token>,
    slots: BTreeMap<BearId, MotionSlot>,
    connection_paths: BTreeMap<ConnectionId, Vec<Cell>>,
    next_token_id: u64,
}

impl SimState {
    /// Create a simulation with an empty grid of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] for a zero dimension.
    pub fn new(rows: usize, cols: usize) -> Result<Self, WorldError> {
        Ok(Self {
            grid: Grid::new(rows, cols)?,
            registry: Registry::new(),
            tints: BTreeMap::new(),
            tokens: BTreeMap::new(),
            slots: BTreeMap::new(),
            connection_paths: BTreeMap::new(),
            next_token_id: 0,
        })
    }

    // -------------------------------------------------------------------
    // Motion slots
    // -------------------------------------------------------------------

    /// The animation slot for a bear, created at its rest position on
    /// first use. Returns `None` for an unknown bear.
    pub fn ensure_slot(&mut self, bear: BearId) -> Option<&mut MotionSlot> {
        let pos = self.registry.bear(bear)?.pos;
        Some(self.slots.entry(bear).or_insert(MotionSlot {
            fine: FinePos::from_cell(pos),
            generation: 0,
            active: false,
        }))
    }

    /// The animation slot for a bear, if one exists.
    pub fn slot(&self, bear: BearId) -> Option<&MotionSlot> {
        self.slots.get(&bear)
    }

    /// The animation slot for a bear, mutable, if one exists.
    pub fn slot_mut(&mut self, bear: BearId) -> Option<&mut MotionSlot> {
        self.slots.get_mut(&bear)
    }

    /// Drop the animation slot of a removed bear.
    pub fn clear_slot(&mut self, bear: BearId) {
        self.slots.remove(&bear);
    }

    /// Interpolated positions of all bears currently mid-animation.
    pub fn fine_positions(&self) -> impl Iterator<Item = (BearId, FinePos)> + '_ {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.active)
            .map(|(id, slot)| (*id, slot.fine))
    }

    // -------------------------------------------------------------------
    // Tokens
    // -------------------------------------------------------------------

    /// Create a transient token at the given position. Returns its id.
    pub fn add_token(&mut self, label: String, pos: FinePos) -> u64 {
        let id = self.next_token_id;
        self.next_token_id = self.next_token_id.wrapping_add(1);
        self.tokens.insert(
            id,
            Token {
                id,
                label,
                color: TokenColor::Neutral,
                pos,
            },
        );
        id
    }

    /// Mutable access to a live token.
    pub fn token_mut(&mut self, id: u64) -> Option<&mut Token> {
        self.tokens.get_mut(&id)
    }

    /// Remove a token. Removing a missing token is a no-op.
    pub fn remove_token(&mut self, id: u64) {
        self.tokens.remove(&id);
    }

    /// Remove every live token (cancellation teardown).
    pub fn clear_tokens(&mut self) {
        self.tokens.clear();
    }

    /// Iterate over live tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    // -------------------------------------------------------------------
    // Connection paths
    // -------------------------------------------------------------------

    /// The grid path a connection's tokens travel, computed once and
    /// cached.
    ///
    /// Endpoints come from the entities' extents: when the source sits
    /// fully left of the destination the path runs bottom-right corner
    /// to bottom-left corner, otherwise bottom-left to bottom-left.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEntity`] when the connection or
    /// either endpoint is gone, and
    /// [`EngineError::UnroutableConnection`] when no walkable path
    /// exists between the endpoints.
    pub fn connection_path(&mut self, id: ConnectionId) -> Result<Vec<Cell>, EngineError> {
        if let Some(path) = self.connection_paths.get(&id) {
            return Ok(path.clone());
        }

        let conn = self
            .registry
            .connection(id)
            .copied()
            .ok_or(EngineError::UnknownEntity(EntityRef::Connection(id)))?;
        let src_extent = self
            .registry
            .extent_of(conn.src)
            .ok_or(EngineError::UnknownEntity(conn.src))?;
        let dst_extent = self
            .registry
            .extent_of(conn.dst)
            .ok_or(EngineError::UnknownEntity(conn.dst))?;

        let (start, goal) = if src_extent.is_fully_left_of(&dst_extent) {
            (src_extent.bottom_right(), dst_extent.bottom_left())
        } else {
            (src_extent.bottom_left(), dst_extent.bottom_left())
        };

        let path = find_anchor_path(&self.grid, start, goal)
            .ok_or(EngineError::UnroutableConnection(id))?;
        self.connection_paths.insert(id, path.clone());
        Ok(path)
    }

    /// Whether a path has already been cached for the connection.
    pub fn has_cached_path(&self, id: ConnectionId) -> bool {
        self.connection_paths.contains_key(&id)
    }
}

/// A cloneable handle to the shared simulation state.
#[derive(Debug, Clone)]
pub struct SimHandle {
    inner: Arc<Mutex<SimState>>,
}

impl SimHandle {
    /// Wrap a simulation state in a shared handle.
    pub fn new(state: SimState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Lock the state. Hold the guard only across straight-line code,
    /// never across animation sleeps.
    pub async fn lock(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().await
    }
}
