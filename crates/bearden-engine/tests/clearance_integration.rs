//! Clearance choreography tests: the door round trip, per-bear
//! at-most-once gating, denial retargets, cancellation idempotence, and
//! the database request/response variant.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use bearden_agents::{BearSpawner, SpawnRequest};
use bearden_engine::config::{ClearanceConfig, MotionConfig};
use bearden_engine::{
    ClearanceBroker, ChoreographyPhase, DecisionSource, DoorCrossing, MotionController,
    SimHandle, SimState, StubDecisionSource,
};
use bearden_types::{
    BearId, Cell, Decision, EntityRef, HouseId, MoveTarget, MovementMode,
};
use bearden_world::{PathConfig, house_door_coords, place_database, place_house};
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// An authority that counts calls and answers after a fixed delay.
struct CountingAuthority {
    calls: AtomicU32,
    authorized: bool,
    delay_ms: u64,
}

#[async_trait]
impl DecisionSource for CountingAuthority {
    async fn authorize(&self, _query: &str) -> Decision {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        Decision {
            authorized: self.authorized,
        }
    }
}

struct World {
    sim: SimHandle,
    motion: MotionController,
    bear: BearId,
    house: HouseId,
    door: Cell,
}

fn setup() -> Option<World> {
    let mut state = SimState::new(25, 25).ok()?;
    let house_pos = Cell::new(5, 11);
    place_house(&mut state.grid, house_pos).ok()?;
    let house = state.registry.add_house(bearden_types::House {
        id: HouseId::new(),
        pos: house_pos,
    });

    let spawner = BearSpawner::default();
    let mut rng = SmallRng::seed_from_u64(5);
    let bear = spawner.spawn(
        &state.grid,
        SpawnRequest {
            pos: Some(Cell::new(0, 0)),
            hunger: Some(0),
            movement: MovementMode::Controlled,
            target: Some(MoveTarget::House(house)),
            ..SpawnRequest::default()
        },
        &mut rng,
    )?;
    let bear = state.registry.add_bear(bear);

    let sim = SimHandle::new(state);
    let motion = MotionController::new(
        sim.clone(),
        MotionConfig::default(),
        PathConfig::default(),
    );
    Some(World {
        sim,
        motion,
        bear,
        house,
        door: house_door_coords(house_pos),
    })
}

fn crossing(world: &World) -> DoorCrossing {
    DoorCrossing {
        bear: world.bear,
        cell: world.door,
        destination: world.door,
    }
}

#[tokio::test(start_paused = true)]
async fn authorized_bear_resumes_and_enters() {
    let Some(world) = setup() else {
        return;
    };
    let broker = ClearanceBroker::new(
        world.motion.clone(),
        Arc::new(StubDecisionSource::allow()),
        ClearanceConfig::default(),
    );

    broker.handle_crossing(crossing(&world)).await;

    assert_eq!(broker.phase(world.bear).await, ChoreographyPhase::Resolved);
    // Authorized and resumed toward the house target: the bear entered
    // and was removed.
    let state = world.sim.lock().await;
    assert!(state.registry.bear(world.bear).is_none());
    // No token survives a settled round trip.
    assert_eq!(state.tokens().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn denied_bear_is_retargeted_to_the_perimeter() {
    let Some(world) = setup() else {
        return;
    };
    let broker = ClearanceBroker::new(
        world.motion.clone(),
        Arc::new(StubDecisionSource::deny()),
        ClearanceConfig::default(),
    );

    broker.handle_crossing(crossing(&world)).await;

    assert_eq!(broker.phase(world.bear).await, ChoreographyPhase::Resolved);
    let state = world.sim.lock().await;
    let Some(bear) = state.registry.bear(world.bear) else {
        assert!(false, "a denied bear stays in the world");
        return;
    };
    // The new target sits on the grid perimeter and the bear walked there.
    let Some(MoveTarget::Cell(target)) = bear.target else {
        assert!(false, "denied bear must have a cell target");
        return;
    };
    let on_edge =
        target.row == 0 || target.row == 24 || target.col == 0 || target.col == 24;
    assert!(on_edge, "target {target} is not on the perimeter");
    assert_eq!(bear.pos, target);
}

#[tokio::test(start_paused = true)]
async fn second_crossing_while_pending_is_ignored() {
    let Some(world) = setup() else {
        return;
    };
    let authority = Arc::new(CountingAuthority {
        calls: AtomicU32::new(0),
        authorized: true,
        delay_ms: 60_000,
    });
    let broker = Arc::new(ClearanceBroker::new(
        world.motion.clone(),
        Arc::clone(&authority) as Arc<dyn DecisionSource>,
        ClearanceConfig::default(),
    ));

    let first_broker = Arc::clone(&broker);
    let first_crossing = crossing(&world);
    let first = tokio::spawn(async move {
        first_broker.handle_crossing(first_crossing).await;
    });

    // Give the first round trip time to reach the authority.
    tokio::time::sleep(tokio::time::Duration::from_millis(2_000)).await;
    // A second crossing for the same bear must not start a second call.
    broker.handle_crossing(crossing(&world)).await;
    assert_eq!(authority.calls.load(Ordering::SeqCst), 1);

    let _ = first.await;
    assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cleared_bear_is_not_gated_again() {
    let Some(world) = setup() else {
        return;
    };
    let authority = Arc::new(CountingAuthority {
        calls: AtomicU32::new(0),
        authorized: false,
        delay_ms: 10,
    });
    let broker = ClearanceBroker::new(
        world.motion.clone(),
        Arc::clone(&authority) as Arc<dyn DecisionSource>,
        ClearanceConfig::default(),
    );

    broker.handle_crossing(crossing(&world)).await;
    broker.handle_crossing(crossing(&world)).await;
    assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_execution_is_idempotent_when_idle() {
    let Some(world) = setup() else {
        return;
    };
    let broker = ClearanceBroker::new(
        world.motion.clone(),
        Arc::new(StubDecisionSource::allow()),
        ClearanceConfig::default(),
    );
    // No active choreography: both calls are clean no-ops.
    broker.cancel_execution().await;
    broker.cancel_execution().await;
    assert_eq!(broker.phase(world.bear).await, ChoreographyPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_decision_tears_down_the_token() {
    let Some(world) = setup() else {
        return;
    };
    let authority = Arc::new(CountingAuthority {
        calls: AtomicU32::new(0),
        authorized: true,
        delay_ms: 60_000,
    });
    let broker = Arc::new(ClearanceBroker::new(
        world.motion.clone(),
        Arc::clone(&authority) as Arc<dyn DecisionSource>,
        ClearanceConfig::default(),
    ));

    let runner = Arc::clone(&broker);
    let pending_crossing = crossing(&world);
    let pending = tokio::spawn(async move {
        runner.handle_crossing(pending_crossing).await;
    });
    tokio::time::sleep(tokio::time::Duration::from_millis(2_000)).await;
    broker.cancel_execution().await;
    let _ = pending.await;

    let state = world.sim.lock().await;
    assert_eq!(state.tokens().count(), 0, "cancel must remove tokens");
    // The bear survives, unresumed but reconciled.
    assert!(state.registry.bear(world.bear).is_some());
}

#[tokio::test(start_paused = true)]
async fn database_round_trip_rides_the_cached_path() {
    let Some(world) = setup() else {
        return;
    };
    let (db_id, conn_id) = {
        let mut state = world.sim.lock().await;
        let db_pos = Cell::new(10, 21);
        let Ok(()) = place_database(&mut state.grid, db_pos) else {
            return;
        };
        let db_id = state.registry.add_database(bearden_types::Database {
            id: bearden_types::DatabaseId::new(),
            pos: db_pos,
        });
        let Ok(conn) = state
            .registry
            .add_connection(EntityRef::House(world.house), EntityRef::Database(db_id))
        else {
            return;
        };
        (db_id, conn.id)
    };

    let broker = ClearanceBroker::new(
        world.motion.clone(),
        Arc::new(StubDecisionSource::allow()),
        ClearanceConfig::default(),
    );

    let reached = Arc::new(AtomicU32::new(0));
    let flag = Arc::clone(&reached);
    let result = broker
        .request_response(EntityRef::House(world.house), db_id, async move {
            flag.fetch_add(1, Ordering::SeqCst);
        })
        .await;
    assert!(result.is_ok());
    assert_eq!(reached.load(Ordering::SeqCst), 1);

    let state = world.sim.lock().await;
    assert!(state.has_cached_path(conn_id));
    assert_eq!(state.tokens().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn database_request_without_connection_is_an_error() {
    let Some(world) = setup() else {
        return;
    };
    let db_id = {
        let mut state = world.sim.lock().await;
        state.registry.add_database(bearden_types::Database {
            id: bearden_types::DatabaseId::new(),
            pos: Cell::new(20, 20),
        })
    };
    let broker = ClearanceBroker::new(
        world.motion.clone(),
        Arc::new(StubDecisionSource::allow()),
        ClearanceConfig::default(),
    );
    let result = broker
        .request_response(EntityRef::House(world.house), db_id, async {})
        .await;
    assert!(result.is_err());
}
