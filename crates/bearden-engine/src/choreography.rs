//! The clearance choreography: door crossings gated by an authority.
//!
//! When a bear's interpolated position enters a gated door, the broker
//! pauses that bear, flies a request token from the house to the
//! authority, awaits the decision, flies the colored decision token
//! back, and then resumes the bear -- toward its original destination
//! when authorized, toward a random perimeter cell when denied.
//!
//! Per bear, at most one round trip is ever active, and a bear that has
//! been cleared once is never re-gated. Other bears' motions are never
//! blocked by a pending decision. The same broker also carries the
//! database request/response variant that rides cached connection paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bearden_types::{
    BearId, BearPatch, Cell, DatabaseId, EntityRef, FinePos, MoveTarget, TokenColor,
};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};

use crate::config::ClearanceConfig;
use crate::decision::DecisionSource;
use crate::error::EngineError;
use crate::motion::{AllowAll, DoorCrossing, MotionController, position_along_path};

/// The lifecycle of one clearance round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoreographyPhase {
    /// Nothing in progress.
    Idle,
    /// The request token is flying to the authority.
    RequestInFlight,
    /// The authority is deciding.
    AwaitingDecision,
    /// The decision token is flying back.
    ResponseInFlight,
    /// The round trip finished and the bear was resumed.
    Resolved,
}

impl core::fmt::Display for ChoreographyPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::RequestInFlight => "request_in_flight",
            Self::AwaitingDecision => "awaiting_decision",
            Self::ResponseInFlight => "response_in_flight",
            Self::Resolved => "resolved",
        };
        write!(f, "{name}")
    }
}

/// Orchestrates clearance round trips and database request/response
/// animations.
pub struct ClearanceBroker {
    motion: MotionController,
    authority: Arc<dyn DecisionSource>,
    config: ClearanceConfig,
    cleared: Mutex<BTreeSet<BearId>>,
    active: Mutex<BTreeSet<BearId>>,
    phases: Mutex<BTreeMap<BearId, ChoreographyPhase>>,
    cancel: watch::Sender<u64>,
}

impl ClearanceBroker {
    /// Create a broker gating doors through the given authority.
    pub fn new(
        motion: MotionController,
        authority: Arc<dyn DecisionSource>,
        config: ClearanceConfig,
    ) -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            motion,
            authority,
            config,
            cleared: Mutex::new(BTreeSet::new()),
            active: Mutex::new(BTreeSet::new()),
            phases: Mutex::new(BTreeMap::new()),
            cancel,
        }
    }

    /// Consume door-crossing events until the channel closes. Each
    /// crossing runs as its own task so one stalled authority never
    /// blocks another bear's round trip.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<DoorCrossing>) {
        while let Some(crossing) = events.recv().await {
            let broker = Arc::clone(&self);
            tokio::spawn(async move {
                broker.handle_crossing(crossing).await;
            });
        }
    }

    /// The current choreography phase for a bear.
    pub async fn phase(&self, bear: BearId) -> ChoreographyPhase {
        self.phases
            .lock()
            .await
            .get(&bear)
            .copied()
            .unwrap_or(ChoreographyPhase::Idle)
    }

    async fn set_phase(&self, bear: BearId, phase: ChoreographyPhase) {
        info!(%bear, %phase, "clearance phase");
        self.phases.lock().await.insert(bear, phase);
    }

    /// Run one clearance round trip for a door crossing.
    ///
    /// A crossing for a bear that is already active or already cleared
    /// is ignored -- never run concurrently, never queued twice.
    pub async fn handle_crossing(&self, crossing: DoorCrossing) {
        let bear = crossing.bear;
        {
            let cleared = self.cleared.lock().await;
            let mut active = self.active.lock().await;
            if cleared.contains(&bear) || !active.insert(bear) {
                debug!(%bear, "clearance already settled or pending, ignoring");
                return;
            }
        }

        let my_gen = *self.cancel.borrow();

        // Freeze the bear where it stands; its pos is now the door area.
        self.motion.pause(bear).await;

        let Some((query, door_anchor)) = self.build_query(bear, crossing.cell).await
        else {
            self.active.lock().await.remove(&bear);
            return;
        };
        let authority_anchor = FinePos::from_cell(self.config.authority_anchor);

        // Request flight.
        self.set_phase(bear, ChoreographyPhase::RequestInFlight).await;
        let token = {
            let mut sim = self.motion.sim().lock().await;
            sim.add_token(query.clone(), door_anchor)
        };
        let flew = self
            .fly(token, door_anchor, authority_anchor, my_gen)
            .await;
        if !flew {
            self.teardown(bear, token).await;
            return;
        }

        // The decision. No timeout on purpose: a stalled authority
        // stalls this one bear and nothing else.
        self.set_phase(bear, ChoreographyPhase::AwaitingDecision).await;
        let decision = self.authority.authorize(&query).await;
        if *self.cancel.borrow() != my_gen {
            self.teardown(bear, token).await;
            return;
        }

        // Response flight, tinted by the verdict.
        self.set_phase(bear, ChoreographyPhase::ResponseInFlight).await;
        {
            let mut sim = self.motion.sim().lock().await;
            if let Some(live) = sim.token_mut(token) {
                live.color = if decision.authorized {
                    TokenColor::Affirmative
                } else {
                    TokenColor::Negative
                };
            }
        }
        let flew = self
            .fly(token, authority_anchor, door_anchor, my_gen)
            .await;
        {
            let mut sim = self.motion.sim().lock().await;
            sim.remove_token(token);
        }
        if !flew {
            self.teardown(bear, token).await;
            return;
        }

        // Denied bears are sent back out to the perimeter.
        if !decision.authorized {
            let mut sim = self.motion.sim().lock().await;
            let mut rng = rand::rng();
            if let Some(cell) = sim.grid.random_perimeter_position(&mut rng) {
                info!(%bear, %cell, "entry denied, retargeting to the perimeter");
                sim.registry.update_bear(
                    bear,
                    BearPatch {
                        target: Some(Some(MoveTarget::Cell(cell))),
                        ..BearPatch::default()
                    },
                );
            } else {
                warn!(%bear, "entry denied but no perimeter cell is open");
            }
        }

        {
            let mut cleared = self.cleared.lock().await;
            cleared.insert(bear);
            self.active.lock().await.remove(&bear);
        }
        self.set_phase(bear, ChoreographyPhase::Resolved).await;

        // Resume toward whatever the bear's target is now; a bear with
        // no registry target heads for the destination of the motion
        // the crossing interrupted.
        let target = {
            let sim = self.motion.sim().lock().await;
            sim.registry
                .bear(bear)
                .map(|record| {
                    record
                        .target
                        .unwrap_or(MoveTarget::Cell(crossing.destination))
                })
        };
        if let Some(target) = target {
            let _ = self
                .motion
                .move_bear_to_target(bear, target, &mut AllowAll)
                .await;
        }
    }

    /// Interrupt all in-progress choreography visuals: token flights
    /// stop, tokens disappear, and the authority's scan is cancelled.
    /// Idempotent; a broker with nothing active shrugs it off.
    pub async fn cancel_execution(&self) {
        self.cancel.send_modify(|generation| {
            *generation = generation.wrapping_add(1);
        });
        self.authority.cancel();
        {
            let mut sim = self.motion.sim().lock().await;
            sim.clear_tokens();
        }
        self.active.lock().await.clear();
        debug!("choreography cancelled");
    }

    /// Animate a request to a database and its response back, along the
    /// cached connection path. `on_request` runs while the token sits at
    /// the database and must finish before the response departs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEntity`] when `src` or the database
    /// is gone, [`EngineError::NotConnected`] when no connection links
    /// them, and [`EngineError::UnroutableConnection`] when the
    /// connection has no path.
    pub async fn request_response<F>(
        &self,
        src: EntityRef,
        database: DatabaseId,
        on_request: F,
    ) -> Result<(), EngineError>
    where
        F: Future<Output = ()> + Send,
    {
        let db_ref = EntityRef::Database(database);
        let (path, label) = {
            let mut sim = self.motion.sim().lock().await;
            if !sim.registry.contains(src) {
                return Err(EngineError::UnknownEntity(src));
            }
            if !sim.registry.contains(db_ref) {
                return Err(EngineError::UnknownEntity(db_ref));
            }
            let conn = sim
                .registry
                .connection_between(src, db_ref)
                .ok_or(EngineError::NotConnected { src, dst: db_ref })?;
            let id = conn.id;
            (sim.connection_path(id)?, format!("req:{id}"))
        };

        let my_gen = *self.cancel.borrow();
        let Some(start) = path.first().copied() else {
            return Ok(());
        };
        let token = {
            let mut sim = self.motion.sim().lock().await;
            sim.add_token(label, FinePos::from_cell(start))
        };

        if self.ride(token, &path, false, my_gen).await {
            on_request.await;
            let _ = self.ride(token, &path, true, my_gen).await;
        }
        let mut sim = self.motion.sim().lock().await;
        sim.remove_token(token);
        Ok(())
    }

    /// Build the clearance query and the door-side anchor for the
    /// token flight. Returns `None` when the bear vanished while
    /// pausing.
    async fn build_query(&self, bear: BearId, door: Cell) -> Option<(String, FinePos)> {
        let sim = self.motion.sim().lock().await;
        let record = sim.registry.bear(bear)?;
        let query = format!(
            "Bear:{name} enter House:{house}",
            name = record.name,
            house = self.config.house_name
        );
        Some((query, FinePos::from_cell(door)))
    }

    /// Fly a token between two anchors. Returns `false` when cancelled.
    async fn fly(&self, token: u64, from: FinePos, to: FinePos, my_gen: u64) -> bool {
        let duration = self.config.flight_duration_ms;
        let frame = self.motion.motion_config().frame_interval_ms.max(1);
        let mut elapsed: u64 = 0;
        while elapsed < duration {
            sleep(Duration::from_millis(frame)).await;
            elapsed = elapsed.saturating_add(frame).min(duration);
            if *self.cancel.borrow() != my_gen {
                return false;
            }
            let mut sim = self.motion.sim().lock().await;
            let Some(live) = sim.token_mut(token) else {
                return false;
            };
            live.pos = FinePos::lerp(from, to, elapsed, duration);
        }
        true
    }

    /// Ride a token along a connection path, forward or backward.
    /// Returns `false` when cancelled.
    async fn ride(&self, token: u64, path: &[Cell], backward: bool, my_gen: u64) -> bool {
        let step = self.config.path_step_ms.max(1);
        let cells = u64::try_from(path.len().saturating_sub(1)).unwrap_or(u64::MAX);
        let total = cells.saturating_mul(step);
        let frame = self.motion.motion_config().frame_interval_ms.max(1);
        let mut elapsed: u64 = 0;
        while elapsed < total {
            sleep(Duration::from_millis(frame)).await;
            elapsed = elapsed.saturating_add(frame).min(total);
            if *self.cancel.borrow() != my_gen {
                return false;
            }
            let along = if backward {
                total.saturating_sub(elapsed)
            } else {
                elapsed
            };
            let Some(pos) = position_along_path(path, along, step) else {
                return false;
            };
            let mut sim = self.motion.sim().lock().await;
            let Some(live) = sim.token_mut(token) else {
                return false;
            };
            live.pos = pos;
        }
        true
    }

    /// Drop the token and the bear's pending-claim after a cancelled
    /// round trip.
    async fn teardown(&self, bear: BearId, token: u64) {
        let mut sim = self.motion.sim().lock().await;
        sim.remove_token(token);
        drop(sim);
        self.active.lock().await.remove(&bear);
        debug!(%bear, "clearance round trip torn down");
    }
}

impl core::fmt::Debug for ClearanceBroker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClearanceBroker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
