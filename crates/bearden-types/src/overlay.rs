//! Transient overlay primitives: request/response tokens.
//!
//! Tokens are short-lived visuals owned by the choreography animations --
//! a query flying from a house to the policy authority, a decision flying
//! back, a database request riding a connection path. They are part of
//! the simulation state only so the scene can draw them; cancellation
//! removes them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::grid::FinePos;

/// The tint of a token, reflecting the decision it carries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TokenColor {
    /// A request still awaiting a decision.
    #[default]
    Neutral,
    /// An authorized decision.
    Affirmative,
    /// A denied decision.
    Negative,
}

/// A transient visual token traveling between two on-screen points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Token {
    /// Identifier unique within the current simulation run.
    pub id: u64,
    /// Text carried by the token (usually the query).
    pub label: String,
    /// Current tint.
    pub color: TokenColor,
    /// Current interpolated position.
    pub pos: FinePos,
}
