//! Error types for the `bearden-engine` crate.
//!
//! Interrupted or abandoned motion is *not* an error -- it resolves as a
//! [`MotionOutcome`](crate::motion::MotionOutcome) variant. Errors here
//! mark caller-supplied inconsistencies: unknown ids, missing
//! connections, out-of-bounds script requests.

use bearden_types::{BearId, Cell, ConnectionId, EntityRef};
use bearden_world::WorldError;

use bearden_agents::AgentError;

/// Errors that can occur in motion, choreography, or scripting.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A bear id did not resolve to a live bear.
    #[error("unknown bear: {0}")]
    UnknownBear(BearId),

    /// An entity reference did not resolve to a live entity.
    #[error("unknown entity: {0:?}")]
    UnknownEntity(EntityRef),

    /// Two entities are not linked by any connection.
    #[error("no connection between {src:?} and {dst:?}")]
    NotConnected {
        /// The requesting endpoint.
        src: EntityRef,
        /// The responding endpoint.
        dst: EntityRef,
    },

    /// A connection's endpoints have no walkable path between them.
    #[error("no path exists for connection {0}")]
    UnroutableConnection(ConnectionId),

    /// A scripted request pointed outside the grid.
    #[error("cell {0} is out of bounds for the grid")]
    OutOfBounds(Cell),

    /// A grid operation failed.
    #[error("world error: {0}")]
    World(#[from] WorldError),

    /// A registry operation failed.
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),
}
