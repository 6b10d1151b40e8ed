//! Demo binary for the Bearden simulation.
//!
//! Runs the canonical contained scene headlessly: a house and a
//! database on a 17x25 grid, a barrage of controlled bears walking at
//! the house door, impostors injected at random intervals, one
//! wandering bear chasing a honeypot, and the clearance choreography
//! gating the door through the simulated authority.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `bearden-config.yaml`
//! 3. Build the world: grid, house, database, connection, honeypot
//! 4. Build the authority from the default policy and resident facts
//! 5. Wire the motion controller and clearance broker
//! 6. Start the barrage, impostor, wanderer, and scene loops
//! 7. Run until the configured duration elapses
//! 8. Cancel outstanding choreography and log the summary

use std::path::Path;
use std::sync::Arc;

use bearden_agents::{BearSpawner, SpawnRequest};
use bearden_engine::config::EngineConfig;
use bearden_engine::{
    AllowAll, ClearanceBroker, MotionController, MotionOutcome, SimHandle, SimState,
    spawn_wanderer,
};
use bearden_policy::{
    Authority, AuthorityConfig, DisplayLine, default_policy, room_name_from_fact,
};
use bearden_scene::{DisplayOptions, SceneRenderer};
use bearden_types::{
    BearKind, Cell, EntityRef, HouseId, MoveTarget, MovementMode,
};
use bearden_world::{RoomPlanner, place_database, place_house};
use rand::Rng;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Grid sizing for the demo scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
struct WorldSection {
    /// Grid rows.
    rows: usize,
    /// Grid columns.
    cols: usize,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self { rows: 17, cols: 25 }
    }
}

/// Run bounds and injection cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
struct RunSection {
    /// Total run time in seconds.
    max_duration_secs: u64,
    /// Interval between barrage bears, in milliseconds.
    bear_interval_ms: u64,
    /// Shortest gap between impostor injections, in milliseconds.
    impostor_min_ms: u64,
    /// Longest gap between impostor injections, in milliseconds.
    impostor_max_ms: u64,
    /// Stop injecting once this many bears are alive.
    max_bears: usize,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            max_duration_secs: 30,
            bear_interval_ms: 1000,
            impostor_min_ms: 1000,
            impostor_max_ms: 5000,
            max_bears: 8,
        }
    }
}

/// Top-level runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct RunnerConfig {
    /// Demo world sizing.
    world: WorldSection,
    /// Engine tunables.
    engine: EngineConfig,
    /// Authority pacing.
    authority: AuthorityConfig,
    /// Run bounds and cadence.
    run: RunSection,
}

fn load_config(path: &Path) -> RunnerConfig {
    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_yml::from_str(&raw) {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "config file unreadable, using defaults");
                RunnerConfig::default()
            }
        },
        Err(_) => {
            info!(path = %path.display(), "no config file, using defaults");
            RunnerConfig::default()
        }
    }
}

/// Application entry point for the demo.
///
/// # Errors
///
/// Returns an error if world construction fails; everything after that
/// degrades gracefully and is logged instead.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("bearden-runner starting");

    // 2. Load configuration.
    let config = load_config(Path::new("bearden-config.yaml"));
    info!(
        rows = config.world.rows,
        cols = config.world.cols,
        max_duration_secs = config.run.max_duration_secs,
        "Configuration loaded"
    );

    // 3. Build the world.
    let mut state = SimState::new(config.world.rows, config.world.cols)?;
    let house_pos = Cell::new(5, 11);
    let db_pos = Cell::new(10, 21);
    place_house(&mut state.grid, house_pos)?;
    place_database(&mut state.grid, db_pos)?;
    let house_id = state.registry.add_house(bearden_types::House {
        id: HouseId::new(),
        pos: house_pos,
    });
    let db_id = state.registry.add_database(bearden_types::Database {
        id: bearden_types::DatabaseId::new(),
        pos: db_pos,
    });
    state
        .registry
        .add_connection(EntityRef::House(house_id), EntityRef::Database(db_id))?;
    // Room facts drive room placement, the way uploaded facts do in the
    // stepped tutorial. A fact whose room cannot be placed is still a
    // fact; the room just does not appear.
    let room_facts = [
        r#"is_in(Room{"kitchen"}, House{"cottage"})"#,
        r#"is_in(Room{"pantry"}, House{"cottage"})"#,
    ];
    {
        let planner = RoomPlanner::new(config.engine.rooms.clone());
        let mut rng = rand::rng();
        for fact in room_facts {
            let name = room_name_from_fact(fact);
            if let Some(room) = planner.place_room(&mut state.grid, name, &mut rng) {
                info!(room = %room.origin, name = ?room.name, "Room placed");
                state.registry.add_room(room);
            }
        }
        if state
            .registry
            .place_honeypot(&state.grid, Some("kitchen"), &mut rng)
            .is_none()
        {
            warn!("no open cell for a honeypot");
        }
    }
    info!(%house_id, %db_id, "World built");

    // 4. Build the authority: the default policy plus the uploaded
    // facts (rooms and residents).
    let facts: Vec<DisplayLine> = room_facts
        .iter()
        .map(|fact| DisplayLine::entry(fact))
        .chain(bearden_agents::RESIDENT_NAMES.iter().map(|name| {
            DisplayLine::entry(&format!(
                "is_resident(Bear{{\"{name}\"}}, House{{\"cottage\"}})"
            ))
        }))
        .collect();
    let (authority_events, mut authority_rx) = mpsc::unbounded_channel();
    let authority = Arc::new(
        Authority::new(default_policy(), facts, config.authority)
            .with_events(authority_events),
    );
    tokio::spawn(async move {
        while let Some(event) = authority_rx.recv().await {
            debug!(?event, "authority");
        }
    });

    // 5. Wire motion and clearance.
    let sim = SimHandle::new(state);
    let (door_events, door_rx) = mpsc::unbounded_channel();
    let motion = MotionController::new(
        sim.clone(),
        config.engine.motion,
        config.engine.paths,
    )
    .with_door_events(door_events);
    let broker = Arc::new(ClearanceBroker::new(
        motion.clone(),
        Arc::clone(&authority) as Arc<dyn bearden_engine::DecisionSource>,
        config.engine.clearance.clone(),
    ));
    tokio::spawn(Arc::clone(&broker).run(door_rx));

    let spawner = BearSpawner::new(config.engine.hunger);

    // 6a. One wandering bear to chase the honeypot.
    {
        let mut guard = sim.lock().await;
        let mut rng = rand::rng();
        let wanderer = spawner.spawn(
            &guard.grid,
            SpawnRequest {
                hunger: Some(3),
                ..SpawnRequest::default()
            },
            &mut rng,
        );
        if let Some(bear) = wanderer {
            let id = guard.registry.add_bear(bear);
            drop(guard);
            spawn_wanderer(motion.clone(), spawner, id);
            info!(%id, "Wanderer spawned");
        }
    }

    // 6b. The barrage: controlled bears walking at the house door.
    let barrage_motion = motion.clone();
    let barrage_sim = sim.clone();
    let barrage_run = config.run;
    tokio::spawn(async move {
        loop {
            sleep(Duration::from_millis(barrage_run.bear_interval_ms)).await;
            let bear = {
                let mut guard = barrage_sim.lock().await;
                if guard.registry.bear_count() >= barrage_run.max_bears {
                    continue;
                }
                let mut rng = rand::rng();
                let spawned = spawner.spawn(
                    &guard.grid,
                    SpawnRequest {
                        movement: MovementMode::Controlled,
                        target: Some(MoveTarget::House(house_id)),
                        hunger: Some(0),
                        ..SpawnRequest::default()
                    },
                    &mut rng,
                );
                spawned.map(|record| guard.registry.add_bear(record))
            };
            let Some(bear) = bear else {
                continue;
            };
            let mover = barrage_motion.clone();
            tokio::spawn(async move {
                let outcome = mover
                    .move_bear_to_target(bear, MoveTarget::House(house_id), &mut AllowAll)
                    .await;
                match outcome {
                    Ok(MotionOutcome::Completed) => {
                        info!(%bear, "barrage bear entered");
                    }
                    Ok(other) => debug!(%bear, ?other, "barrage motion ended"),
                    Err(error) => debug!(%bear, %error, "barrage motion failed"),
                }
            });
        }
    });

    // 6c. Impostor injection: one alive at a time, random cadence.
    let impostor_motion = motion.clone();
    let impostor_sim = sim.clone();
    let impostor_run = config.run;
    tokio::spawn(async move {
        loop {
            let wait = {
                let mut rng = rand::rng();
                rng.random_range(impostor_run.impostor_min_ms..=impostor_run.impostor_max_ms)
            };
            sleep(Duration::from_millis(wait)).await;
            let bear = {
                let mut guard = impostor_sim.lock().await;
                let has_impostor = guard
                    .registry
                    .bears()
                    .any(|record| record.kind == BearKind::Impostor);
                if has_impostor {
                    continue;
                }
                let mut rng = rand::rng();
                let spawned = spawner.spawn(
                    &guard.grid,
                    SpawnRequest {
                        kind: BearKind::Impostor,
                        movement: MovementMode::Controlled,
                        target: Some(MoveTarget::House(house_id)),
                        hunger: Some(0),
                        ..SpawnRequest::default()
                    },
                    &mut rng,
                );
                spawned.map(|record| guard.registry.add_bear(record))
            };
            let Some(bear) = bear else {
                continue;
            };
            info!(%bear, "Impostor injected");
            let mover = impostor_motion.clone();
            tokio::spawn(async move {
                let _ = mover
                    .move_bear_to_target(bear, MoveTarget::House(house_id), &mut AllowAll)
                    .await;
            });
        }
    });

    // 6d. Scene loop: project the state the way a frontend would.
    let scene_sim = sim.clone();
    tokio::spawn(async move {
        let renderer = SceneRenderer::new(DisplayOptions {
            show_bear_names: true,
            show_house_labels: true,
            ..DisplayOptions::default()
        });
        loop {
            sleep(Duration::from_millis(500)).await;
            let mut guard = scene_sim.lock().await;
            match renderer.render(&mut guard) {
                Ok(scene) => debug!(
                    bears = scene.bears.len(),
                    tokens = scene.tokens.len(),
                    "scene"
                ),
                Err(error) => warn!(%error, "scene projection failed"),
            }
        }
    });

    // 7. Run for the configured duration.
    sleep(Duration::from_secs(config.run.max_duration_secs)).await;

    // 8. Tear down choreography and summarize.
    broker.cancel_execution().await;
    let guard = sim.lock().await;
    info!(
        bears_remaining = guard.registry.bear_count(),
        honeypots = guard.registry.honeypots().count(),
        "bearden-runner finished"
    );
    Ok(())
}
