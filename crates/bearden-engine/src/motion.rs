//! Path-following motion: cancelable, time-based, replannable.
//!
//! The [`MotionController`] drives one bear at a time along a
//! precomputed cell path as a continuous linear transition whose
//! duration scales with path length. Many bears' motions interleave
//! freely; per bear they are strictly sequential -- starting a new
//! motion interrupts the previous one, exactly like a named transition
//! replacing its predecessor.
//!
//! Interruption, rejection, and "no path" are all *normal* outcomes: the
//! returned future resolves with a [`MotionOutcome`] and never turns
//! control-flow into an error.

use bearden_types::{BearId, Cell, CellState, EntityRef, FinePos, MoveTarget};
use bearden_world::{PathConfig, house_door_coords, search_path};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};

use crate::config::MotionConfig;
use crate::error::EngineError;
use crate::sim::SimHandle;

/// What a [`StepGate`] says about one step of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepVerdict {
    /// Whether the step may be taken.
    pub proceed: bool,
    /// When the step is rejected, whether a fresh path to the original
    /// destination should be searched from the current cell.
    pub find_new_path: bool,
}

impl StepVerdict {
    /// Allow the step.
    pub const fn allow() -> Self {
        Self {
            proceed: true,
            find_new_path: false,
        }
    }

    /// Reject the step and stop the motion.
    pub const fn halt() -> Self {
        Self {
            proceed: false,
            find_new_path: false,
        }
    }

    /// Reject the step and ask for a replan.
    pub const fn reroute() -> Self {
        Self {
            proceed: false,
            find_new_path: true,
        }
    }
}

/// Consulted synchronously for every step of a path before the animation
/// plays.
pub trait StepGate: Send {
    /// Judge the step from `current` to `next`.
    fn validate_step(&mut self, current: Cell, next: Cell) -> StepVerdict;
}

/// The gate that lets every step through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl StepGate for AllowAll {
    fn validate_step(&mut self, _current: Cell, _next: Cell) -> StepVerdict {
        StepVerdict::allow()
    }
}

/// Fired when a moving bear's interpolated position enters a door cell.
/// Fired once per crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorCrossing {
    /// The bear that crossed.
    pub bear: BearId,
    /// The door cell it entered.
    pub cell: Cell,
    /// Where the interrupted motion was headed.
    pub destination: Cell,
}

/// How a motion ended. Every variant is normal control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// The bear reached the destination; its `pos` is reconciled.
    Completed,
    /// Another motion, a pause, or bear removal interrupted this one.
    Interrupted,
    /// The gate rejected a step with no reroute; `pos` is left at the
    /// last reconciled value for the caller to fix up.
    Halted,
    /// No path was found (including replan exhaustion); the bear did not
    /// move.
    NoPath,
    /// No path existed for a scripted move; the bear played a bounce and
    /// stayed put.
    Bounced,
}

/// Drives bears along paths. Cheap to clone; clones share the same
/// simulation.
#[derive(Debug, Clone)]
pub struct MotionController {
    sim: SimHandle,
    motion: MotionConfig,
    paths: PathConfig,
    door_events: Option<mpsc::UnboundedSender<DoorCrossing>>,
}

impl MotionController {
    /// Create a controller over the shared simulation.
    pub const fn new(sim: SimHandle, motion: MotionConfig, paths: PathConfig) -> Self {
        Self {
            sim,
            motion,
            paths,
            door_events: None,
        }
    }

    /// Attach a door-crossing event channel (the clearance gate).
    #[must_use]
    pub fn with_door_events(mut self, events: mpsc::UnboundedSender<DoorCrossing>) -> Self {
        self.door_events = Some(events);
        self
    }

    /// The shared simulation handle.
    pub const fn sim(&self) -> &SimHandle {
        &self.sim
    }

    /// The path-search configuration this controller plans with.
    pub const fn path_config(&self) -> PathConfig {
        self.paths
    }

    /// The motion timing configuration.
    pub const fn motion_config(&self) -> MotionConfig {
        self.motion
    }

    /// Resolve a target, search a path from the bear's current position,
    /// and move. A house target resolves to its door cell; completing a
    /// house motion removes the bear (it entered).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownBear`] or
    /// [`EngineError::UnknownEntity`] for dead references. "No path" is
    /// not an error; it resolves as [`MotionOutcome::NoPath`].
    pub async fn move_bear_to_target(
        &self,
        bear: BearId,
        target: MoveTarget,
        gate: &mut dyn StepGate,
    ) -> Result<MotionOutcome, EngineError> {
        let (path, destination) = {
            let sim = self.sim.lock().await;
            let record = sim
                .registry
                .bear(bear)
                .ok_or(EngineError::UnknownBear(bear))?;
            let destination = match target {
                MoveTarget::Cell(cell) => cell,
                MoveTarget::House(id) => {
                    let house = sim
                        .registry
                        .house(id)
                        .ok_or(EngineError::UnknownEntity(EntityRef::House(id)))?;
                    house_door_coords(house.pos)
                }
            };
            let path = search_path(&sim.grid, record.pos, destination, self.paths);
            (path, destination)
        };

        let Some(path) = path else {
            debug!(%bear, %destination, "no path found for bear to target");
            return Ok(MotionOutcome::NoPath);
        };

        let outcome = self.move_along_path(bear, path, destination, gate).await?;

        if outcome == MotionOutcome::Completed
            && let MoveTarget::House(house) = target
        {
            let mut sim = self.sim.lock().await;
            sim.registry.remove_bear(bear);
            sim.clear_slot(bear);
            info!(%bear, %house, "bear entered the house");
        }
        Ok(outcome)
    }

    /// Animate a bear along a precomputed path toward `destination`.
    ///
    /// Every step is validated through `gate` before the transition
    /// starts. A rejected step with `find_new_path` triggers a fresh
    /// search from the rejected position, bounded by the path-search
    /// retry ceiling; a rejection without it halts the motion early.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownBear`] when the bear does not exist
    /// at the time the animation starts.
    pub async fn move_along_path(
        &self,
        bear: BearId,
        path: Vec<Cell>,
        destination: Cell,
        gate: &mut dyn StepGate,
    ) -> Result<MotionOutcome, EngineError> {
        let Some(path) = self.validate_path(bear, path, destination, gate).await else {
            return Ok(MotionOutcome::NoPath);
        };
        let Some(path) = path else {
            return Ok(MotionOutcome::Halted);
        };
        self.animate(bear, &path, destination).await
    }

    /// Validate (and possibly re-plan) the path.
    ///
    /// Returns `None` for "give up, no path", `Some(None)` for an early
    /// halt, and `Some(Some(path))` for a fully validated path.
    #[allow(clippy::option_option)]
    async fn validate_path(
        &self,
        bear: BearId,
        mut path: Vec<Cell>,
        destination: Cell,
        gate: &mut dyn StepGate,
    ) -> Option<Option<Vec<Cell>>> {
        if path.is_empty() {
            return None;
        }
        let mut replans: u32 = 0;
        'validate: loop {
            let last = path.len().saturating_sub(1);
            for idx in 0..last {
                let current = path.get(idx).copied()?;
                let next = path.get(idx.saturating_add(1)).copied()?;
                let verdict = gate.validate_step(current, next);
                if verdict.proceed {
                    continue;
                }
                if verdict.find_new_path {
                    replans = replans.saturating_add(1);
                    if replans >= self.paths.max_tries {
                        warn!(%bear, "replan ceiling reached, giving up");
                        return None;
                    }
                    // Fresh grid snapshot at the instant of the re-search.
                    let replanned = {
                        let sim = self.sim.lock().await;
                        search_path(&sim.grid, current, destination, self.paths)
                    };
                    match replanned {
                        Some(new_path) => {
                            debug!(%bear, %current, "rerouting from rejected step");
                            path = new_path;
                            continue 'validate;
                        }
                        None => return None,
                    }
                }
                debug!(%bear, %current, %next, "step rejected, halting motion");
                return Some(None);
            }
            return Some(Some(path));
        }
    }

    /// Play the continuous transition along a validated path.
    async fn animate(
        &self,
        bear: BearId,
        path: &[Cell],
        destination: Cell,
    ) -> Result<MotionOutcome, EngineError> {
        let steps = u64::try_from(path.len().saturating_sub(1)).unwrap_or(u64::MAX);
        let total_ms = steps.saturating_mul(self.motion.step_duration_ms);
        let frame_ms = self.motion.frame_interval_ms.max(1);

        let my_gen = {
            let mut sim = self.sim.lock().await;
            let slot = sim
                .ensure_slot(bear)
                .ok_or(EngineError::UnknownBear(bear))?;
            slot.generation = slot.generation.wrapping_add(1);
            slot.active = true;
            if let Some(start) = path.first() {
                slot.fine = FinePos::from_cell(*start);
            }
            slot.generation
        };

        let mut last_cell = path.first().copied().unwrap_or(destination);
        let mut elapsed: u64 = 0;

        while elapsed < total_ms {
            sleep(Duration::from_millis(frame_ms)).await;
            elapsed = elapsed.saturating_add(frame_ms).min(total_ms);

            let fine = position_along_path(path, elapsed, self.motion.step_duration_ms)
                .unwrap_or_else(|| FinePos::from_cell(destination));

            let mut sim = self.sim.lock().await;
            let Some(slot) = sim.slot_mut(bear) else {
                // The bear was removed mid-flight.
                return Ok(MotionOutcome::Interrupted);
            };
            if slot.generation != my_gen {
                debug!(%bear, "motion interrupted by a newer transition");
                return Ok(MotionOutcome::Interrupted);
            }
            slot.fine = fine;

            let cell = fine.nearest_cell();
            if cell != last_cell {
                last_cell = cell;
                if sim.grid.get(cell) == Some(CellState::Door)
                    && let Some(events) = &self.door_events
                {
                    debug!(%bear, %cell, "bear crossing a door");
                    let _ = events.send(DoorCrossing {
                        bear,
                        cell,
                        destination,
                    });
                }
            }
        }

        // Completion: the interpolated position becomes authoritative.
        let mut sim = self.sim.lock().await;
        let Some(slot) = sim.slot_mut(bear) else {
            return Ok(MotionOutcome::Interrupted);
        };
        if slot.generation != my_gen {
            return Ok(MotionOutcome::Interrupted);
        }
        slot.active = false;
        slot.fine = FinePos::from_cell(destination);
        if let Some(record) = sim.registry.bear_mut(bear) {
            record.pos = destination;
        }
        Ok(MotionOutcome::Completed)
    }

    /// Move a bear to an exact cell, playing a bounce when no path
    /// exists. Used by the scripting surface.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownBear`] for a dead bear id.
    pub async fn move_bear(
        &self,
        bear: BearId,
        cell: Cell,
    ) -> Result<MotionOutcome, EngineError> {
        let (path, from) = {
            let sim = self.sim.lock().await;
            let record = sim
                .registry
                .bear(bear)
                .ok_or(EngineError::UnknownBear(bear))?;
            (
                search_path(&sim.grid, record.pos, cell, self.paths),
                record.pos,
            )
        };
        match path {
            Some(path) => {
                self.move_along_path(bear, path, cell, &mut AllowAll).await
            }
            None => {
                debug!(%bear, %cell, "no path for scripted move, bouncing");
                self.bounce(bear, from, cell).await?;
                Ok(MotionOutcome::Bounced)
            }
        }
    }

    /// Interrupt a bear's in-flight transition and reconcile its `pos`
    /// to the nearest cell under its interpolated position. This is the
    /// only way a visual position becomes the authoritative grid
    /// position mid-flight. Pausing an idle bear is a no-op.
    pub async fn pause(&self, bear: BearId) {
        let mut sim = self.sim.lock().await;
        let Some(slot) = sim.slot_mut(bear) else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        if !slot.active {
            return;
        }
        slot.active = false;
        let cell = slot.fine.nearest_cell();
        slot.fine = FinePos::from_cell(cell);
        if let Some(record) = sim.registry.bear_mut(bear) {
            record.pos = cell;
            debug!(%bear, %cell, "paused, position reconciled");
        }
    }

    /// Pause every bear that currently has an animation slot.
    pub async fn pause_all(&self) {
        let ids: Vec<BearId> = {
            let sim = self.sim.lock().await;
            sim.registry.bears().map(|b| b.id).collect()
        };
        for id in ids {
            self.pause(id).await;
        }
    }

    /// A short there-and-back nudge toward an unreachable target.
    async fn bounce(
        &self,
        bear: BearId,
        from: Cell,
        toward: Cell,
    ) -> Result<(), EngineError> {
        let rest = FinePos::from_cell(from);
        let next = step_toward(from, toward);
        let lean = FinePos::lerp(rest, FinePos::from_cell(next), 1, 2);

        let my_gen = {
            let mut sim = self.sim.lock().await;
            let slot = sim
                .ensure_slot(bear)
                .ok_or(EngineError::UnknownBear(bear))?;
            slot.generation = slot.generation.wrapping_add(1);
            slot.active = true;
            slot.generation
        };

        let out = self
            .glide(bear, my_gen, rest, lean, self.motion.bounce_out_ms)
            .await;
        if out {
            self.glide(bear, my_gen, lean, rest, self.motion.bounce_back_ms)
                .await;
        }

        let mut sim = self.sim.lock().await;
        if let Some(slot) = sim.slot_mut(bear)
            && slot.generation == my_gen
        {
            slot.active = false;
            slot.fine = rest;
        }
        Ok(())
    }

    /// Frame loop for a plain point-to-point glide (no door checks).
    /// Returns `false` when interrupted.
    async fn glide(
        &self,
        bear: BearId,
        my_gen: u64,
        from: FinePos,
        to: FinePos,
        duration_ms: u64,
    ) -> bool {
        let frame_ms = self.motion.frame_interval_ms.max(1);
        let mut elapsed: u64 = 0;
        while elapsed < duration_ms {
            sleep(Duration::from_millis(frame_ms)).await;
            elapsed = elapsed.saturating_add(frame_ms).min(duration_ms);
            let mut sim = self.sim.lock().await;
            let Some(slot) = sim.slot_mut(bear) else {
                return false;
            };
            if slot.generation != my_gen {
                return false;
            }
            slot.fine = FinePos::lerp(from, to, elapsed, duration_ms);
        }
        true
    }
}

/// The interpolated position `elapsed` milliseconds into a transition
/// that spends `step_ms` per path segment.
pub(crate) fn position_along_path(path: &[Cell], elapsed: u64, step_ms: u64) -> Option<FinePos> {
    let step_ms = step_ms.max(1);
    let segment = usize::try_from(elapsed.checked_div(step_ms)?).ok()?;
    let within = elapsed.checked_rem(step_ms)?;

    let last = path.len().checked_sub(1)?;
    if segment >= last {
        return path.last().copied().map(FinePos::from_cell);
    }
    let from = FinePos::from_cell(path.get(segment).copied()?);
    let to = FinePos::from_cell(path.get(segment.checked_add(1)?).copied()?);
    Some(FinePos::lerp(from, to, within, step_ms))
}

/// One grid step from `current` toward `dest`: rows first, then columns.
fn step_toward(current: Cell, dest: Cell) -> Cell {
    if dest.row != current.row {
        let row = if dest.row > current.row {
            current.row.saturating_add(1)
        } else {
            current.row.saturating_sub(1)
        };
        return Cell::new(row, current.col);
    }
    if dest.col != current.col {
        let col = if dest.col > current.col {
            current.col.saturating_add(1)
        } else {
            current.col.saturating_sub(1)
        };
        return Cell::new(current.row, col);
    }
    current
}
