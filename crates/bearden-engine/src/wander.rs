//! Autonomous wandering.
//!
//! A wandering bear self-schedules: when a motion finishes it picks the
//! next target -- the first honeypot if it is hungry and one exists,
//! else a random standing cell -- rerolls its hunger, and immediately
//! starts the next motion. The loop is unbounded and ends only when the
//! bear is removed, its motion is interrupted, or path searching gives
//! up.

use bearden_agents::BearSpawner;
use bearden_types::{BearId, BearPatch, MoveTarget, MovementMode};
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{debug, info};

use crate::motion::{AllowAll, MotionController, MotionOutcome};

/// Spawn the self-re-triggering wander task for one bear.
pub fn spawn_wanderer(
    motion: MotionController,
    spawner: BearSpawner,
    bear: BearId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        wander_loop(&motion, spawner, bear).await;
    })
}

/// Run the wander loop until the bear stops being a wanderer.
pub async fn wander_loop(motion: &MotionController, spawner: BearSpawner, bear: BearId) {
    loop {
        // Pick the target from the state as it is *now*, not as it was
        // when the previous motion started.
        let target = {
            let sim = motion.sim().lock().await;
            let Some(record) = sim.registry.bear(bear) else {
                return;
            };
            if record.movement == MovementMode::Controlled {
                return;
            }
            let honeypot = sim.registry.first_honeypot().map(|pot| pot.pos);
            match honeypot {
                // A hungry bear heads for the honeypot -- and parks on
                // it while the hunger lasts.
                Some(pos) if record.hunger > 0 => pos,
                _ => {
                    let mut rng = rand::rng();
                    match sim.grid.random_standing_position(&mut rng) {
                        Some(cell) => cell,
                        None => return,
                    }
                }
            }
        };

        let current = {
            let sim = motion.sim().lock().await;
            sim.registry.bear(bear).map(|record| record.pos)
        };
        if current == Some(target) {
            // Nowhere new to go this round; wait one step and re-pick.
            sleep(Duration::from_millis(
                motion.motion_config().step_duration_ms,
            ))
            .await;
            continue;
        }

        let outcome = match motion
            .move_bear_to_target(bear, MoveTarget::Cell(target), &mut AllowAll)
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => return,
        };

        match outcome {
            MotionOutcome::Completed => {
                let hunger = {
                    let mut rng = rand::rng();
                    spawner.reroll_hunger(&mut rng)
                };
                let mut sim = motion.sim().lock().await;
                let updated = sim.registry.update_bear(
                    bear,
                    BearPatch {
                        hunger: Some(hunger),
                        ..BearPatch::default()
                    },
                );
                if !updated {
                    return;
                }
            }
            MotionOutcome::NoPath => {
                info!(%bear, "wanderer found no path, going idle");
                return;
            }
            _ => {
                debug!(%bear, "wander motion interrupted, stopping the loop");
                return;
            }
        }
    }
}
