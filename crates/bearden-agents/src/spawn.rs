//! Bear creation and the hunger rules.
//!
//! The [`BearSpawner`] builds new bears with identity, a name drawn from
//! the kind-appropriate pool, and an initial hunger roll. The hunger
//! probabilities are configuration, not constants: the original values
//! (20% initial, 75% after each autonomous move) are defaults that an
//! operator can tune.

use bearden_types::{Bear, BearId, BearKind, Cell, MoveTarget, MovementMode};
use bearden_world::Grid;
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;

/// Name pool for resident bears.
pub const RESIDENT_NAMES: [&str; 4] = ["Smokey", "Yogi", "Winnie", "Teddy"];

/// Name pool for impostor bears.
pub const IMPOSTOR_NAMES: [&str; 4] = ["Pat", "John", "Max", "Rex"];

/// Tunables for hunger rolls.
///
/// Percentages are integers in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HungerConfig {
    /// Chance that a freshly spawned bear is hungry.
    pub initial_hunger_pct: u32,
    /// Chance that a bear becomes hungry again after finishing an
    /// autonomous move.
    pub rehunger_pct: u32,
    /// Smallest hunger level rolled when a bear is hungry.
    pub min_level: u32,
    /// Largest hunger level rolled when a bear is hungry.
    pub max_level: u32,
}

impl Default for HungerConfig {
    fn default() -> Self {
        Self {
            initial_hunger_pct: 20,
            rehunger_pct: 75,
            min_level: 1,
            max_level: 5,
        }
    }
}

/// Caller-controlled parts of a spawn. Unset fields are rolled or
/// defaulted by the spawner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Resident or impostor.
    pub kind: BearKind,
    /// Explicit name; drawn from the pools when absent.
    pub name: Option<String>,
    /// Explicit position; a random standing position when absent.
    pub pos: Option<Cell>,
    /// Explicit hunger level; rolled when absent.
    pub hunger: Option<u32>,
    /// Movement mode for the new bear.
    pub movement: MovementMode,
    /// Initial destination, if any.
    pub target: Option<MoveTarget>,
}

/// Builds bears and rolls hunger.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearSpawner {
    config: HungerConfig,
}

impl BearSpawner {
    /// Create a spawner with the given hunger configuration.
    pub const fn new(config: HungerConfig) -> Self {
        Self { config }
    }

    /// Build a new bear.
    ///
    /// Returns `None` only when no position was supplied and the grid
    /// has no walkable cell to stand on.
    pub fn spawn(
        &self,
        grid: &Grid,
        request: SpawnRequest,
        rng: &mut impl Rng,
    ) -> Option<Bear> {
        let pos = match request.pos {
            Some(pos) => pos,
            None => grid.random_standing_position(rng)?,
        };
        let hunger = request
            .hunger
            .unwrap_or_else(|| self.roll_hunger(self.config.initial_hunger_pct, rng));
        let name = request
            .name
            .unwrap_or_else(|| pick_name(request.kind, rng));

        Some(Bear {
            id: BearId::new(),
            kind: request.kind,
            name,
            pos,
            hunger,
            movement: request.movement,
            target: request.target,
            created_at: Utc::now(),
        })
    }

    /// Roll hunger after a completed autonomous move.
    pub fn reroll_hunger(&self, rng: &mut impl Rng) -> u32 {
        self.roll_hunger(self.config.rehunger_pct, rng)
    }

    fn roll_hunger(&self, pct: u32, rng: &mut impl Rng) -> u32 {
        if rng.random_range(0..100) < pct {
            rng.random_range(self.config.min_level..=self.config.max_level)
        } else {
            0
        }
    }
}

/// Draw a random name from the pool matching the bear's kind.
fn pick_name(kind: BearKind, rng: &mut impl Rng) -> String {
    let pool: &[&str] = match kind {
        BearKind::Resident => &RESIDENT_NAMES,
        BearKind::Impostor => &IMPOSTOR_NAMES,
    };
    let idx = rng.random_range(0..pool.len());
    pool.get(idx).copied().unwrap_or("Smokey").to_owned()
}
