//! The declarative scene and its renderer.
//!
//! [`SceneRenderer::render`] projects the current simulation state into
//! a flat set of positioned, styled primitives for an external drawing
//! surface. The projection is idempotent: the same state and options
//! produce the same scene, in the same order, every time. The only
//! side effect is filling the connection-path cache on first render.

use bearden_engine::{EngineError, SimState};
use bearden_types::{
    BearId, BearKind, Cell, CellState, ConnectionId, DatabaseId, FinePos, HoneypotId, HouseId,
    Token,
};
use bearden_world::{is_in_any_database, is_in_any_house};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::options::DisplayOptions;

/// Errors that can occur while projecting the scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A connection referenced an entity that no longer resolves, or
    /// its endpoints cannot be routed.
    #[error("connection projection failed: {0}")]
    Connection(#[from] EngineError),
}

/// How a grid cell is filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CellFill {
    /// Open floor.
    Empty,
    /// A wall segment.
    Wall,
    /// A doorway.
    Door,
    /// A script-applied tint (CSS color string).
    Tint(String),
}

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CellNode {
    /// The cell position.
    pub cell: Cell,
    /// How the cell is filled.
    pub fill: CellFill,
}

/// One bear glyph with its optional name and kind label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BearNode {
    /// The bear.
    pub id: BearId,
    /// Emoji glyph by kind.
    pub glyph: String,
    /// Interpolated position (mid-flight) or the rest cell center.
    pub pos: FinePos,
    /// Display name, when names are on.
    pub name: Option<String>,
    /// Kind label, when this bear is labeled.
    pub label: Option<String>,
    /// Whether the policy "actor" highlight frame is on.
    pub highlighted: bool,
}

/// One house icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HouseNode {
    /// The house.
    pub id: HouseId,
    /// Anchor (top-left) cell.
    pub pos: Cell,
    /// Label, when house labels are on.
    pub label: Option<String>,
    /// Whether the policy "resource" highlight frame is on.
    pub highlighted: bool,
}

/// One database icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DatabaseNode {
    /// The database.
    pub id: DatabaseId,
    /// Anchor (top-left) cell.
    pub pos: Cell,
    /// Fixed label text.
    pub label: String,
}

/// One honeypot glyph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HoneypotNode {
    /// The honeypot.
    pub id: HoneypotId,
    /// The cell it sits on.
    pub pos: Cell,
    /// Emoji glyph.
    pub glyph: String,
}

/// One connection polyline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConnectionNode {
    /// The connection.
    pub id: ConnectionId,
    /// The cached cell path its tokens ride.
    pub path: Vec<Cell>,
}

/// A complete scene: everything the drawing surface needs, nothing it
/// has to compute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Scene {
    /// Grid cells in row-major order.
    pub cells: Vec<CellNode>,
    /// Bears in spawn order.
    pub bears: Vec<BearNode>,
    /// Honeypots in placement order.
    pub honeypots: Vec<HoneypotNode>,
    /// Houses in placement order.
    pub houses: Vec<HouseNode>,
    /// Databases in placement order.
    pub databases: Vec<DatabaseNode>,
    /// Connections in creation order.
    pub connections: Vec<ConnectionNode>,
    /// Transient request/response tokens.
    pub tokens: Vec<Token>,
}

/// Projects simulation state into scenes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneRenderer {
    options: DisplayOptions,
}

impl SceneRenderer {
    /// Create a renderer with the given display options.
    pub const fn new(options: DisplayOptions) -> Self {
        Self { options }
    }

    /// Replace the display options (tutorial steps flip these).
    pub const fn set_options(&mut self, options: DisplayOptions) {
        self.options = options;
    }

    /// Project the current state into a scene.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Connection`] when a connection references
    /// a dead entity or cannot be routed -- a caller-data
    /// inconsistency, not a drawing concern.
    pub fn render(&self, sim: &mut SimState) -> Result<Scene, SceneError> {
        // Connections first: they are the only part that needs the
        // mutable borrow (cache fill on first render).
        let connection_ids: Vec<ConnectionId> =
            sim.registry.connections().map(|conn| conn.id).collect();
        let mut connections = Vec::new();
        for id in connection_ids {
            let path = sim.connection_path(id)?;
            connections.push(ConnectionNode { id, path });
        }

        let houses: Vec<bearden_types::House> = sim.registry.houses().copied().collect();
        let databases: Vec<bearden_types::Database> =
            sim.registry.databases().copied().collect();

        let cells = sim
            .grid
            .iter()
            .map(|(cell, state)| CellNode {
                cell,
                fill: self.fill_for(sim, &houses, &databases, cell, state),
            })
            .collect();

        let in_flight: std::collections::BTreeMap<BearId, FinePos> =
            sim.fine_positions().collect();
        let bears = sim
            .registry
            .bears()
            .map(|bear| BearNode {
                id: bear.id,
                glyph: glyph_for(bear.kind).to_owned(),
                pos: in_flight
                    .get(&bear.id)
                    .copied()
                    .unwrap_or_else(|| FinePos::from_cell(bear.pos)),
                name: self
                    .options
                    .show_bear_names
                    .then(|| bear.name.clone()),
                label: self
                    .options
                    .bear_labels
                    .shows(bear)
                    .then(|| label_for(bear.kind).to_owned()),
                highlighted: self.options.show_policy_highlights,
            })
            .collect();

        let honeypots = sim
            .registry
            .honeypots()
            .map(|pot| HoneypotNode {
                id: pot.id,
                pos: pot.pos,
                glyph: String::from("\u{1f36f}"),
            })
            .collect();

        let house_nodes = houses
            .iter()
            .map(|house| HouseNode {
                id: house.id,
                pos: house.pos,
                label: self
                    .options
                    .show_house_labels
                    .then(|| String::from("Your app")),
                highlighted: self.options.show_policy_highlights,
            })
            .collect();

        let database_nodes = databases
            .iter()
            .map(|db| DatabaseNode {
                id: db.id,
                pos: db.pos,
                label: String::from("Your database"),
            })
            .collect();

        let tokens = sim.tokens().cloned().collect();

        Ok(Scene {
            cells,
            bears,
            honeypots,
            houses: house_nodes,
            databases: database_nodes,
            connections,
            tokens,
        })
    }

    /// Structure footprints are drawn as icons, so the stamped walls
    /// underneath render as plain floor.
    fn fill_for(
        &self,
        sim: &SimState,
        houses: &[bearden_types::House],
        databases: &[bearden_types::Database],
        cell: Cell,
        state: CellState,
    ) -> CellFill {
        if let Some(tint) = sim.tints.get(&cell) {
            return CellFill::Tint(tint.clone());
        }
        if is_in_any_house(houses, cell) || is_in_any_database(databases, cell) {
            return CellFill::Empty;
        }
        match state {
            CellState::Empty => CellFill::Empty,
            CellState::Wall => CellFill::Wall,
            CellState::Door => CellFill::Door,
        }
    }
}

const fn glyph_for(kind: BearKind) -> &'static str {
    match kind {
        BearKind::Resident => "\u{1f43b}",
        BearKind::Impostor => "\u{1f43c}",
    }
}

const fn label_for(kind: BearKind) -> &'static str {
    match kind {
        BearKind::Resident => "A resident",
        BearKind::Impostor => "An impostor",
    }
}
