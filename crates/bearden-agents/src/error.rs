//! Error types for the `bearden-agents` crate.
//!
//! Only caller-supplied data inconsistencies are errors here. Removal of
//! a missing bear, a failed honeypot placement, and similar empty
//! outcomes are modeled as no-ops or `None`, not as errors.

use bearden_types::EntityRef;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A reference pointed at an entity that does not exist in any table.
    #[error("unknown entity: {0:?}")]
    UnknownEntity(EntityRef),

    /// A connection between the two endpoints already exists.
    #[error("connection between {src:?} and {dst:?} already exists")]
    DuplicateConnection {
        /// One endpoint of the offending connection.
        src: EntityRef,
        /// The other endpoint.
        dst: EntityRef,
    },
}
