//! Bear lifecycle, hunger rules, and the entity registry for the Bearden
//! simulation.
//!
//! # Modules
//!
//! - [`error`] -- Error types for registry operations.
//! - [`registry`] -- The authoritative tables of bears, rooms,
//!   structures, honeypots, and connections, with typed generic lookup.
//! - [`spawn`] -- The bear factory, name pools, and hunger rolls.

pub mod error;
pub mod registry;
pub mod spawn;

// Re-export primary types at crate root.
pub use error::AgentError;
pub use registry::{Entity, Registry};
pub use spawn::{BearSpawner, HungerConfig, IMPOSTOR_NAMES, RESIDENT_NAMES, SpawnRequest};
