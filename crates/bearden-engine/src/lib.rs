//! Motion, choreography, and orchestration for the Bearden simulation.
//!
//! This crate is the engine room: the shared simulation state, the
//! cancelable path-following motion controller with mid-flight
//! replanning, the autonomous wander loop, the clearance choreography
//! that gates doors through an asynchronous authority, and the movement
//! primitives exposed to scripted bears.
//!
//! Scheduling is single-threaded cooperative: all motions are
//! independently progressing, time-driven animations multiplexed on the
//! async runtime. There are no locks on the hot path beyond the one
//! state mutex, held only across straight-line code.
//!
//! # Modules
//!
//! - [`config`] -- Engine configuration with YAML loading.
//! - [`decision`] -- The asynchronous authority seam and a test stub.
//! - [`error`] -- Error types for engine operations.
//! - [`sim`] -- The shared simulation state and handle.
//! - [`motion`] -- Path-following motion, pause/reconcile, bounce.
//! - [`wander`] -- The self-re-triggering autonomous movement loop.
//! - [`choreography`] -- Clearance round trips and database
//!   request/response animations.
//! - [`script`] -- Movement primitives for externally scripted bears.

pub mod choreography;
pub mod config;
pub mod decision;
pub mod error;
pub mod motion;
pub mod script;
pub mod sim;
pub mod wander;

// Re-export primary types at crate root.
pub use choreography::{ChoreographyPhase, ClearanceBroker};
pub use config::{ClearanceConfig, ConfigError, EngineConfig, MotionConfig};
pub use decision::{DecisionSource, StubDecisionSource};
pub use error::EngineError;
pub use motion::{
    AllowAll, DoorCrossing, MotionController, MotionOutcome, StepGate, StepVerdict,
};
pub use script::ScriptWorld;
pub use sim::{MotionSlot, SimHandle, SimState};
pub use wander::{spawn_wanderer, wander_loop};
