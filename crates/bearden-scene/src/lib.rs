//! Declarative scene projection of the Bearden simulation.
//!
//! The drawing surface (an external SVG/canvas frontend) consumes a
//! [`Scene`]: a flat, typed set of positioned primitives. This crate
//! owns the projection from simulation state to scene, including
//! structure occlusion, label visibility rules, and the cached
//! connection polylines that request/response tokens reuse.
//!
//! # Modules
//!
//! - [`options`] -- Display toggles and the bear-label predicate.
//! - [`scene`] -- Scene node types and the renderer.

pub mod options;
pub mod scene;

// Re-export primary types at crate root.
pub use options::{DisplayOptions, LabelMode};
pub use scene::{
    BearNode, CellFill, CellNode, ConnectionNode, DatabaseNode, HoneypotNode, HouseNode,
    Scene, SceneError, SceneRenderer,
};
