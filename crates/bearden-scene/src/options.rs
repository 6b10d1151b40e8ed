//! Display options for the scene projection.

use bearden_types::Bear;

/// When bear kind labels are shown.
///
/// The predicate variant mirrors callers that only label some bears
/// (e.g. impostors during one tutorial step).
#[derive(Clone, Copy, Default)]
pub enum LabelMode {
    /// Label every bear.
    All,
    /// Label no bear.
    #[default]
    None,
    /// Label the bears the predicate selects.
    Filter(fn(&Bear) -> bool),
}

impl LabelMode {
    /// Whether this mode labels the given bear.
    pub fn shows(&self, bear: &Bear) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Filter(predicate) => predicate(bear),
        }
    }
}

impl core::fmt::Debug for LabelMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::None => write!(f, "None"),
            Self::Filter(_) => write!(f, "Filter(..)"),
        }
    }
}

/// Toggles for what the scene includes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    /// Show bear display names under the glyphs.
    pub show_bear_names: bool,
    /// Which bears get kind labels.
    pub bear_labels: LabelMode,
    /// Show the "your app" label on houses.
    pub show_house_labels: bool,
    /// Show the policy actor/resource highlights on bears and houses.
    pub show_policy_highlights: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bearden_types::{BearId, BearKind, Cell, MovementMode};
    use chrono::Utc;

    fn impostor() -> Bear {
        Bear {
            id: BearId::new(),
            kind: BearKind::Impostor,
            name: String::from("Pat"),
            pos: Cell::new(0, 0),
            hunger: 0,
            movement: MovementMode::Controlled,
            target: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filter_mode_consults_the_predicate() {
        let mode = LabelMode::Filter(|bear| bear.kind == BearKind::Impostor);
        assert!(mode.shows(&impostor()));
        assert!(!LabelMode::None.shows(&impostor()));
        assert!(LabelMode::All.shows(&impostor()));
    }
}
