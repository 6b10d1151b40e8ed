//! Fact/query grammars and the simulated policy authority for the
//! Bearden simulation.
//!
//! The engine only knows the decision seam
//! ([`DecisionSource`](bearden_engine::DecisionSource)); this crate
//! supplies the on-screen rendition of a policy engine behind it: fixed
//! text grammars, ordered display lines, and the paced, cancelable
//! highlight scan that produces `{authorized}` decisions.
//!
//! # Modules
//!
//! - [`facts`] -- The `name(Type{"value"}, ...)` fact grammar.
//! - [`query`] -- The `Type:value permission Type:value` query grammar.
//! - [`lines`] -- Policy/fact display lines and the default policy.
//! - [`authority`] -- The simulated authority and its highlight events.

pub mod authority;
pub mod facts;
pub mod lines;
pub mod query;

// Re-export primary types at crate root.
pub use authority::{Authority, AuthorityConfig, AuthorityEvent, ScanTarget};
pub use facts::{ParsedFact, TypedValue, format_fact, parse_fact, room_name_from_fact};
pub use lines::{DisplayLine, default_policy};
pub use query::{ParsedQuery, parse_query};
