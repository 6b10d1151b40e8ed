//! End-to-end motion tests: target resolution, replanning, pause
//! reconciliation, interruption, and the bounce fallback.
//!
//! All tests run on a paused clock, so the time-based transitions play
//! out instantly while keeping their relative timing.

use bearden_agents::{BearSpawner, SpawnRequest};
use bearden_engine::{
    AllowAll, MotionController, MotionOutcome, SimHandle, SimState, StepGate, StepVerdict,
};
use bearden_engine::config::MotionConfig;
use bearden_types::{Cell, CellState, MoveTarget, MovementMode};
use bearden_world::{PathConfig, house_door_coords, place_house};
use bearden_types::{BearId, HouseId};
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// A 25x25 world with one house at (5, 11) and one controlled bear.
fn setup(bear_pos: Cell) -> Option<(SimHandle, MotionController, BearId, HouseId)> {
    let mut state = SimState::new(25, 25).ok()?;
    let house_pos = Cell::new(5, 11);
    place_house(&mut state.grid, house_pos).ok()?;
    let house_id = state.registry.add_house(bearden_types::House {
        id: HouseId::new(),
        pos: house_pos,
    });

    let spawner = BearSpawner::default();
    let mut rng = SmallRng::seed_from_u64(17);
    let bear = spawner.spawn(
        &state.grid,
        SpawnRequest {
            pos: Some(bear_pos),
            hunger: Some(0),
            movement: MovementMode::Controlled,
            ..SpawnRequest::default()
        },
        &mut rng,
    )?;
    let bear_id = state.registry.add_bear(bear);

    let sim = SimHandle::new(state);
    let controller = MotionController::new(
        sim.clone(),
        MotionConfig::default(),
        PathConfig::default(),
    );
    Some((sim, controller, bear_id, house_id))
}

#[tokio::test(start_paused = true)]
async fn bear_walks_into_the_house_and_is_removed() {
    let Some((sim, controller, bear, house)) = setup(Cell::new(0, 0)) else {
        return;
    };
    // The canonical door: a house at (5, 11) opens at (8, 13).
    assert_eq!(house_door_coords(Cell::new(5, 11)), Cell::new(8, 13));

    let outcome = controller
        .move_bear_to_target(bear, MoveTarget::House(house), &mut AllowAll)
        .await;
    assert!(matches!(outcome, Ok(MotionOutcome::Completed)));

    // Entering a house removes the bear.
    let state = sim.lock().await;
    assert!(state.registry.bear(bear).is_none());
}

#[tokio::test(start_paused = true)]
async fn pause_reconciles_to_a_valid_cell() {
    let Some((sim, controller, bear, _)) = setup(Cell::new(0, 0)) else {
        return;
    };
    let runner = controller.clone();
    let motion = tokio::spawn(async move {
        runner
            .move_bear_to_target(bear, MoveTarget::Cell(Cell::new(0, 20)), &mut AllowAll)
            .await
    });

    // Let the transition get a few steps in, then freeze it.
    tokio::time::sleep(tokio::time::Duration::from_millis(950)).await;
    controller.pause(bear).await;

    let pos = {
        let state = sim.lock().await;
        state.registry.bear(bear).map(|b| b.pos)
    };
    let Some(pos) = pos else {
        assert!(false, "bear must survive a pause");
        return;
    };
    // Reconciled onto the straight-line path it was walking.
    assert_eq!(pos.row, 0);
    assert!(pos.col <= 20, "pos {pos} should not overshoot");
    assert!(pos.col > 0, "pos {pos} should have advanced before the pause");

    let outcome = motion.await.ok();
    assert!(matches!(outcome, Some(Ok(MotionOutcome::Interrupted))));
}

struct HaltAt {
    cell: Cell,
}

impl StepGate for HaltAt {
    fn validate_step(&mut self, _current: Cell, next: Cell) -> StepVerdict {
        if next == self.cell {
            StepVerdict::halt()
        } else {
            StepVerdict::allow()
        }
    }
}

#[tokio::test(start_paused = true)]
async fn halting_gate_ends_the_motion_without_moving() {
    let Some((sim, controller, bear, _)) = setup(Cell::new(0, 0)) else {
        return;
    };
    let mut gate = HaltAt {
        cell: Cell::new(0, 3),
    };
    let outcome = controller
        .move_bear_to_target(bear, MoveTarget::Cell(Cell::new(0, 10)), &mut gate)
        .await;
    assert!(matches!(outcome, Ok(MotionOutcome::Halted)));

    // Validation happens before any animation: the bear never moved and
    // its pos is whatever it was before (the caller reconciles).
    let state = sim.lock().await;
    assert_eq!(state.registry.bear(bear).map(|b| b.pos), Some(Cell::new(0, 0)));
}

struct RerouteOnce {
    cell: Cell,
    fired: bool,
}

impl StepGate for RerouteOnce {
    fn validate_step(&mut self, _current: Cell, next: Cell) -> StepVerdict {
        if next == self.cell && !self.fired {
            self.fired = true;
            return StepVerdict::reroute();
        }
        StepVerdict::allow()
    }
}

#[tokio::test(start_paused = true)]
async fn rerouting_gate_still_reaches_the_destination() {
    let Some((sim, controller, bear, _)) = setup(Cell::new(0, 0)) else {
        return;
    };
    let mut gate = RerouteOnce {
        cell: Cell::new(0, 2),
        fired: false,
    };
    let destination = Cell::new(0, 6);
    let outcome = controller
        .move_bear_to_target(bear, MoveTarget::Cell(destination), &mut gate)
        .await;
    assert!(matches!(outcome, Ok(MotionOutcome::Completed)));
    assert!(gate.fired);

    let state = sim.lock().await;
    assert_eq!(state.registry.bear(bear).map(|b| b.pos), Some(destination));
}

#[tokio::test(start_paused = true)]
async fn walled_in_target_bounces() {
    let Some((sim, controller, bear, _)) = setup(Cell::new(0, 0)) else {
        return;
    };
    // Box in a target cell completely.
    {
        let mut state = sim.lock().await;
        for cell in [
            Cell::new(19, 20),
            Cell::new(21, 20),
            Cell::new(20, 19),
            Cell::new(20, 21),
        ] {
            let _ = state.grid.set(cell, CellState::Wall);
        }
    }
    let outcome = controller.move_bear(bear, Cell::new(20, 20)).await;
    assert!(matches!(outcome, Ok(MotionOutcome::Bounced)));

    // The bounce is pure feedback; the bear's pos never changed.
    let state = sim.lock().await;
    assert_eq!(state.registry.bear(bear).map(|b| b.pos), Some(Cell::new(0, 0)));
}

#[tokio::test(start_paused = true)]
async fn a_new_motion_interrupts_the_previous_one() {
    let Some((sim, controller, bear, _)) = setup(Cell::new(0, 0)) else {
        return;
    };
    let first_controller = controller.clone();
    let first = tokio::spawn(async move {
        first_controller
            .move_bear_to_target(bear, MoveTarget::Cell(Cell::new(0, 24)), &mut AllowAll)
            .await
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(700)).await;

    // Taking over mid-flight: the second motion wins, the first resolves
    // as interrupted rather than erroring.
    let second = controller
        .move_bear_to_target(bear, MoveTarget::Cell(Cell::new(5, 0)), &mut AllowAll)
        .await;
    assert!(matches!(second, Ok(MotionOutcome::Completed)));

    let first = first.await.ok();
    assert!(matches!(first, Some(Ok(MotionOutcome::Interrupted))));

    let state = sim.lock().await;
    assert_eq!(state.registry.bear(bear).map(|b| b.pos), Some(Cell::new(5, 0)));
}

#[tokio::test(start_paused = true)]
async fn unknown_bear_is_an_error_not_an_outcome() {
    let Some((_, controller, _, _)) = setup(Cell::new(0, 0)) else {
        return;
    };
    let ghost = BearId::new();
    let result = controller
        .move_bear_to_target(ghost, MoveTarget::Cell(Cell::new(1, 1)), &mut AllowAll)
        .await;
    assert!(result.is_err());
}
