//! Display lines for policies and facts.
//!
//! The authority walks ordered sequences of lines during its highlight
//! scan. A line is either a blank spacer (skipped by the scan) or an
//! entry with optional explanation text for the tutorial surface.

use serde::{Deserialize, Serialize};

/// One display line of a policy or fact listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayLine {
    /// A spacer with no content; the scan passes over it.
    Blank,
    /// A line of policy or fact text.
    Entry {
        /// The text itself.
        line: String,
        /// Optional explanation shown next to the line.
        explanation: Option<String>,
    },
}

impl DisplayLine {
    /// A blank spacer.
    pub const fn blank() -> Self {
        Self::Blank
    }

    /// A plain entry. Whitespace-only text becomes a spacer.
    pub fn entry(line: &str) -> Self {
        if line.trim().is_empty() {
            Self::Blank
        } else {
            Self::Entry {
                line: line.to_owned(),
                explanation: None,
            }
        }
    }

    /// An entry with an explanation.
    pub fn annotated(line: &str, explanation: &str) -> Self {
        Self::Entry {
            line: line.to_owned(),
            explanation: Some(explanation.to_owned()),
        }
    }

    /// The scannable text of this line, if it has any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Blank => None,
            Self::Entry { line, .. } => Some(line),
        }
    }
}

/// The default house policy used by the demos.
pub fn default_policy() -> Vec<DisplayLine> {
    vec![
        DisplayLine::annotated(
            "actor Bear{}",
            "Who will be performing actions in our application.",
        ),
        DisplayLine::blank(),
        DisplayLine::annotated("resource House{}", "What actors will be acting upon."),
        DisplayLine::blank(),
        DisplayLine::annotated(
            "has_permission(bear:Bear, \"enter\", house:House) if\n  is_resident(bear, house);",
            "A rule stating that bears who are residents of the house can enter.",
        ),
    ]
}
