//! Decision source trait and stub implementation.
//!
//! When a bear crosses a gated door, the clearance broker sends a
//! textual query to an authority and awaits a [`Decision`]. The
//! [`DecisionSource`] trait abstracts the mechanism by which decisions
//! are obtained -- a simulated policy engine, a remote service, or a
//! test stub. The engine only depends on this seam, never on how the
//! decision is computed.
//!
//! There is deliberately no timeout: a stalled authority stalls the one
//! bear awaiting it, and nothing else.

use async_trait::async_trait;
use bearden_types::Decision;

/// An asynchronous source of authorization decisions.
///
/// Queries follow the documented shape
/// `"<ActorType>:<ActorValue> <permission> <ResourceType>:<ResourceValue>"`.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    /// Decide whether the query is authorized. May take arbitrarily long.
    async fn authorize(&self, query: &str) -> Decision;

    /// Interrupt any in-progress decision work (highlight scans and the
    /// like). Must be idempotent and safe to call when nothing is
    /// running. The default does nothing.
    fn cancel(&self) {}
}

/// A stub decision source with a fixed answer.
///
/// Used by tests and by demos that run without a policy engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDecisionSource {
    /// The answer every query receives.
    pub authorized: bool,
}

impl StubDecisionSource {
    /// A stub that authorizes everything.
    pub const fn allow() -> Self {
        Self { authorized: true }
    }

    /// A stub that denies everything.
    pub const fn deny() -> Self {
        Self { authorized: false }
    }
}

#[async_trait]
impl DecisionSource for StubDecisionSource {
    async fn authorize(&self, _query: &str) -> Decision {
        Decision {
            authorized: self.authorized,
        }
    }
}
