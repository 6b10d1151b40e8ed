//! Movement primitives for externally scripted bears.
//!
//! An external script runtime (not part of this workspace) drives one
//! bear through this symbol table: relative moves, absolute teleports,
//! renaming, cell tinting, pausing, and one-cell probes. Every primitive
//! settles when its visual effect has completed or failed.

use bearden_types::{BearId, BearPatch, Cell, CellState, FinePos};
use tokio::time::{Duration, sleep};
use tracing::debug;

use crate::error::EngineError;
use crate::motion::{MotionController, MotionOutcome};

/// The scripting surface for a single bear.
#[derive(Debug, Clone)]
pub struct ScriptWorld {
    motion: MotionController,
    bear: BearId,
}

impl ScriptWorld {
    /// Bind the scripting surface to one bear.
    pub const fn new(motion: MotionController, bear: BearId) -> Self {
        Self { motion, bear }
    }

    /// The bear's current rest position.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownBear`] when the bear is gone.
    pub async fn current_pos(&self) -> Result<Cell, EngineError> {
        let sim = self.motion.sim().lock().await;
        sim.registry
            .bear(self.bear)
            .map(|record| record.pos)
            .ok_or(EngineError::UnknownBear(self.bear))
    }

    /// Move `steps` cells up (toward row 0). Resolves to the position
    /// after the move; a blocked move bounces and leaves it unchanged.
    pub async fn move_up(&self, steps: usize) -> Result<Cell, EngineError> {
        let pos = self.current_pos().await?;
        self.walk_to(Cell::new(pos.row.saturating_sub(steps), pos.col))
            .await
    }

    /// Move `steps` cells down.
    pub async fn move_down(&self, steps: usize) -> Result<Cell, EngineError> {
        let pos = self.current_pos().await?;
        self.walk_to(Cell::new(pos.row.saturating_add(steps), pos.col))
            .await
    }

    /// Move `steps` cells left.
    pub async fn move_left(&self, steps: usize) -> Result<Cell, EngineError> {
        let pos = self.current_pos().await?;
        self.walk_to(Cell::new(pos.row, pos.col.saturating_sub(steps)))
            .await
    }

    /// Move `steps` cells right.
    pub async fn move_right(&self, steps: usize) -> Result<Cell, EngineError> {
        let pos = self.current_pos().await?;
        self.walk_to(Cell::new(pos.row, pos.col.saturating_add(steps)))
            .await
    }

    async fn walk_to(&self, cell: Cell) -> Result<Cell, EngineError> {
        let outcome = self.motion.move_bear(self.bear, cell).await?;
        if outcome == MotionOutcome::Bounced {
            debug!(bear = %self.bear, %cell, "scripted move bounced");
        }
        self.current_pos().await
    }

    /// Jump straight to an absolute cell, with no pathfinding.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] when the cell is outside the
    /// grid, or [`EngineError::UnknownBear`] when the bear is gone.
    pub async fn go_to(&self, row: usize, col: usize) -> Result<(), EngineError> {
        let cell = Cell::new(row, col);
        let mut sim = self.motion.sim().lock().await;
        if !sim.grid.contains(cell) {
            return Err(EngineError::OutOfBounds(cell));
        }
        if !sim.registry.update_bear(
            self.bear,
            BearPatch {
                pos: Some(cell),
                ..BearPatch::default()
            },
        ) {
            return Err(EngineError::UnknownBear(self.bear));
        }
        if let Some(slot) = sim.slot_mut(self.bear) {
            slot.generation = slot.generation.wrapping_add(1);
            slot.active = false;
            slot.fine = FinePos::from_cell(cell);
        }
        Ok(())
    }

    /// Change the bear's display name.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownBear`] when the bear is gone.
    pub async fn set_name(&self, name: &str) -> Result<(), EngineError> {
        let mut sim = self.motion.sim().lock().await;
        if sim.registry.update_bear(
            self.bear,
            BearPatch {
                name: Some(name.to_owned()),
                ..BearPatch::default()
            },
        ) {
            Ok(())
        } else {
            Err(EngineError::UnknownBear(self.bear))
        }
    }

    /// Tint the cell the bear currently stands on. Returns that cell.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownBear`] when the bear is gone.
    pub async fn set_cell_tint(&self, color: &str) -> Result<Cell, EngineError> {
        let mut sim = self.motion.sim().lock().await;
        let pos = sim
            .registry
            .bear(self.bear)
            .map(|record| record.pos)
            .ok_or(EngineError::UnknownBear(self.bear))?;
        sim.tints.insert(pos, color.to_owned());
        Ok(pos)
    }

    /// Suspend the script for the given number of milliseconds.
    pub async fn pause_for(&self, ms: u64) {
        sleep(Duration::from_millis(ms)).await;
    }

    /// The state of the cell just left of the bear; `None` off-grid.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownBear`] when the bear is gone.
    pub async fn look_left(&self) -> Result<Option<CellState>, EngineError> {
        let pos = self.current_pos().await?;
        let sim = self.motion.sim().lock().await;
        Ok(pos
            .col
            .checked_sub(1)
            .and_then(|col| sim.grid.get(Cell::new(pos.row, col))))
    }

    /// The state of the cell just right of the bear; `None` off-grid.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownBear`] when the bear is gone.
    pub async fn look_right(&self) -> Result<Option<CellState>, EngineError> {
        let pos = self.current_pos().await?;
        let sim = self.motion.sim().lock().await;
        Ok(pos
            .col
            .checked_add(1)
            .and_then(|col| sim.grid.get(Cell::new(pos.row, col))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionConfig;
    use crate::sim::{SimHandle, SimState};
    use bearden_types::{Bear, BearId, BearKind, MovementMode};
    use bearden_world::PathConfig;
    use chrono::Utc;

    fn scripted_world() -> Option<ScriptWorld> {
        let mut state = SimState::new(10, 10).ok()?;
        let bear = Bear {
            id: BearId::new(),
            kind: BearKind::Resident,
            name: String::from("Smokey"),
            pos: Cell::new(5, 5),
            hunger: 0,
            movement: MovementMode::Controlled,
            target: None,
            created_at: Utc::now(),
        };
        let id = state.registry.add_bear(bear);
        let motion = MotionController::new(
            SimHandle::new(state),
            MotionConfig::default(),
            PathConfig::default(),
        );
        Some(ScriptWorld::new(motion, id))
    }

    #[tokio::test(start_paused = true)]
    async fn relative_moves_land_where_expected() {
        let Some(world) = scripted_world() else {
            return;
        };
        assert_eq!(world.move_right(2).await.ok(), Some(Cell::new(5, 7)));
        assert_eq!(world.move_up(3).await.ok(), Some(Cell::new(2, 7)));
        assert_eq!(world.move_left(1).await.ok(), Some(Cell::new(2, 6)));
        assert_eq!(world.move_down(1).await.ok(), Some(Cell::new(3, 6)));
    }

    #[tokio::test(start_paused = true)]
    async fn go_to_rejects_out_of_bounds() {
        let Some(world) = scripted_world() else {
            return;
        };
        assert!(world.go_to(20, 0).await.is_err());
        // In-bounds teleport skips pathfinding entirely.
        assert!(world.go_to(0, 9).await.is_ok());
        assert_eq!(world.current_pos().await.ok(), Some(Cell::new(0, 9)));
    }

    #[tokio::test(start_paused = true)]
    async fn probes_see_neighbors_and_edges() {
        let Some(world) = scripted_world() else {
            return;
        };
        assert_eq!(world.look_left().await.ok(), Some(Some(CellState::Empty)));
        // At the right edge there is nothing to see.
        let _ = world.go_to(0, 9).await;
        assert_eq!(world.look_right().await.ok(), Some(None));
    }

    #[tokio::test(start_paused = true)]
    async fn tint_and_rename_touch_the_state() {
        let Some(world) = scripted_world() else {
            return;
        };
        assert!(world.set_name("Scout").await.is_ok());
        let tinted = world.set_cell_tint("goldenrod").await.ok();
        assert_eq!(tinted, Some(Cell::new(5, 5)));

        let sim = world.motion.sim().lock().await;
        assert_eq!(
            sim.registry.bear(world.bear).map(|b| b.name.clone()),
            Some(String::from("Scout"))
        );
        assert_eq!(
            sim.tints.get(&Cell::new(5, 5)).map(String::as_str),
            Some("goldenrod")
        );
    }
}
