//! Wander loop tests: hungry bears chase the honeypot, and removing a
//! bear ends its loop.

use bearden_agents::{BearSpawner, HungerConfig, SpawnRequest};
use bearden_engine::config::MotionConfig;
use bearden_engine::{MotionController, SimHandle, SimState, spawn_wanderer};
use bearden_types::{Cell, Honeypot, HoneypotId, MovementMode};
use bearden_world::PathConfig;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[tokio::test(start_paused = true)]
async fn hungry_wanderer_finds_the_honeypot() {
    let Ok(mut state) = SimState::new(12, 12) else {
        return;
    };
    let pot = Cell::new(0, 6);
    state.registry.add_honeypot(Honeypot {
        id: HoneypotId::new(),
        pos: pot,
    });

    // Always re-hungry: after every move the bear wants the honeypot
    // again, so it parks there.
    let spawner = BearSpawner::new(HungerConfig {
        initial_hunger_pct: 100,
        rehunger_pct: 100,
        min_level: 1,
        max_level: 5,
    });
    let mut rng = SmallRng::seed_from_u64(44);
    let Some(bear) = spawner.spawn(
        &state.grid,
        SpawnRequest {
            pos: Some(Cell::new(0, 0)),
            hunger: Some(3),
            movement: MovementMode::Wandering,
            ..SpawnRequest::default()
        },
        &mut rng,
    ) else {
        return;
    };
    let bear_id = state.registry.add_bear(bear);

    let sim = SimHandle::new(state);
    let motion = MotionController::new(
        sim.clone(),
        MotionConfig::default(),
        PathConfig::default(),
    );
    let task = spawn_wanderer(motion, spawner, bear_id);

    // Six cells at 300ms each, plus slack for the re-pick sleeps.
    tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
    {
        let state = sim.lock().await;
        assert_eq!(state.registry.bear(bear_id).map(|b| b.pos), Some(pot));
        // Re-hungry after arrival.
        assert!(state.registry.bear(bear_id).is_some_and(|b| b.hunger > 0));
    }

    // Removing the bear ends the loop.
    {
        let mut state = sim.lock().await;
        state.registry.remove_bear(bear_id);
        state.clear_slot(bear_id);
    }
    tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
    assert!(task.is_finished());
}

#[tokio::test(start_paused = true)]
async fn sated_wanderer_keeps_rolling_targets() {
    let Ok(mut state) = SimState::new(12, 12) else {
        return;
    };
    // Never hungry: the bear picks random standing cells instead.
    let spawner = BearSpawner::new(HungerConfig {
        initial_hunger_pct: 0,
        rehunger_pct: 0,
        min_level: 1,
        max_level: 5,
    });
    let mut rng = SmallRng::seed_from_u64(45);
    let Some(bear) = spawner.spawn(
        &state.grid,
        SpawnRequest {
            pos: Some(Cell::new(6, 6)),
            hunger: Some(0),
            movement: MovementMode::Wandering,
            ..SpawnRequest::default()
        },
        &mut rng,
    ) else {
        return;
    };
    let bear_id = state.registry.add_bear(bear);

    let sim = SimHandle::new(state);
    let motion = MotionController::new(
        sim.clone(),
        MotionConfig::default(),
        PathConfig::default(),
    );
    let task = spawn_wanderer(motion, spawner, bear_id);

    tokio::time::sleep(tokio::time::Duration::from_secs(20)).await;
    {
        let state = sim.lock().await;
        // Still alive, still not hungry, still wandering.
        assert_eq!(state.registry.bear(bear_id).map(|b| b.hunger), Some(0));
    }
    {
        let mut state = sim.lock().await;
        state.registry.remove_bear(bear_id);
        state.clear_slot(bear_id);
    }
    tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
    assert!(task.is_finished());
}
