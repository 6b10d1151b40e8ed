//! The simulated policy authority.
//!
//! [`Authority`] implements the engine's decision seam by acting the
//! part of a policy engine on screen: it walks its policy lines with a
//! fixed per-step delay, then scans the fact list for a structural
//! match, pacing each comparison and emitting highlight events for the
//! UI. Every suspension point is cancelable; a cancelled scan resolves
//! denied without running anything downstream.

use async_trait::async_trait;
use bearden_engine::DecisionSource;
use bearden_types::Decision;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::{Duration, sleep};
use tracing::debug;

use crate::facts::{format_fact, parse_fact};
use crate::lines::DisplayLine;
use crate::query::parse_query;

/// Pacing for the visual scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Delay before a verdict settles (start, match, and exhaustion).
    pub settle_delay_ms: u64,
    /// Per-line delay while scanning facts.
    pub fact_step_ms: u64,
    /// Per-line delay while walking the policy.
    pub policy_step_ms: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            fact_step_ms: 250,
            policy_step_ms: 350,
        }
    }
}

/// Which listing a scan event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanTarget {
    /// The policy listing.
    Policy,
    /// The fact listing.
    Facts,
}

/// Highlight events emitted while the authority works, for whatever
/// surface wants to draw them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityEvent {
    /// A scan began (border flash).
    ScanStarted {
        /// The listing being scanned.
        target: ScanTarget,
    },
    /// The highlight moved onto a line.
    LineFocused {
        /// The listing being scanned.
        target: ScanTarget,
        /// Index among the listing's scannable lines.
        index: usize,
    },
    /// A line's status dot settled.
    LineVerdict {
        /// The listing being scanned.
        target: ScanTarget,
        /// Index among the listing's scannable lines.
        index: usize,
        /// Whether the line matched.
        matched: bool,
    },
    /// The scan finished normally.
    ScanFinished {
        /// The listing that finished.
        target: ScanTarget,
    },
    /// The scan was cancelled mid-sequence.
    ScanCancelled {
        /// The listing that was cancelled.
        target: ScanTarget,
    },
}

/// The simulated policy engine.
pub struct Authority {
    policy: Vec<DisplayLine>,
    facts: Mutex<Vec<DisplayLine>>,
    config: AuthorityConfig,
    events: Option<mpsc::UnboundedSender<AuthorityEvent>>,
    cancel: watch::Sender<u64>,
}

impl Authority {
    /// Create an authority over a fixed policy and an initial fact list.
    pub fn new(
        policy: Vec<DisplayLine>,
        facts: Vec<DisplayLine>,
        config: AuthorityConfig,
    ) -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            policy,
            facts: Mutex::new(facts),
            config,
            events: None,
            cancel,
        }
    }

    /// Attach a highlight-event channel.
    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<AuthorityEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Append a fact line (facts are uploaded over time).
    pub async fn add_fact(&self, line: DisplayLine) {
        self.facts.lock().await.push(line);
    }

    /// Interrupt any in-progress scan. Idempotent; harmless when
    /// nothing is scanning.
    pub fn cancel_scan(&self) {
        self.cancel.send_modify(|generation| {
            *generation = generation.wrapping_add(1);
        });
    }

    /// Scan the fact list for a structural match of `target_fact`.
    ///
    /// Resolves `{authorized: true}` on the first match,
    /// `{authorized: false}` after exhausting the list -- including the
    /// zero-candidate case, which still waits one settle delay. An
    /// unparsable target never matches anything.
    pub async fn search_for_fact(&self, target_fact: &str) -> Decision {
        let my_gen = *self.cancel.borrow();
        let wanted = parse_fact(target_fact);

        self.emit(AuthorityEvent::ScanStarted {
            target: ScanTarget::Facts,
        });

        let lines: Vec<String> = {
            let facts = self.facts.lock().await;
            facts
                .iter()
                .filter_map(|line| line.content().map(ToOwned::to_owned))
                .collect()
        };

        if lines.is_empty() {
            let finished = self.step(self.config.settle_delay_ms, my_gen).await;
            self.finish(ScanTarget::Facts, finished);
            return Decision { authorized: false };
        }

        for (index, line) in lines.iter().enumerate() {
            self.emit(AuthorityEvent::LineFocused {
                target: ScanTarget::Facts,
                index,
            });
            if !self.step(self.config.fact_step_ms, my_gen).await {
                self.finish(ScanTarget::Facts, false);
                return Decision { authorized: false };
            }

            let matched = match (&wanted, parse_fact(line)) {
                (Some(want), Some(have)) => *want == have,
                _ => false,
            };
            self.emit(AuthorityEvent::LineVerdict {
                target: ScanTarget::Facts,
                index,
                matched,
            });

            if matched {
                let finished = self.step(self.config.settle_delay_ms, my_gen).await;
                self.finish(ScanTarget::Facts, finished);
                return Decision { authorized: true };
            }
        }

        let finished = self.step(self.config.settle_delay_ms, my_gen).await;
        self.finish(ScanTarget::Facts, finished);
        Decision { authorized: false }
    }

    /// Sleep one paced step; `false` means the scan was cancelled.
    async fn step(&self, ms: u64, my_gen: u64) -> bool {
        let mut rx = self.cancel.subscribe();
        if *rx.borrow() != my_gen {
            return false;
        }
        tokio::select! {
            () = sleep(Duration::from_millis(ms)) => *self.cancel.borrow() == my_gen,
            _ = rx.changed() => false,
        }
    }

    fn finish(&self, target: ScanTarget, cleanly: bool) {
        if cleanly {
            self.emit(AuthorityEvent::ScanFinished { target });
        } else {
            debug!(?target, "scan cancelled mid-sequence");
            self.emit(AuthorityEvent::ScanCancelled { target });
        }
    }

    fn emit(&self, event: AuthorityEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

#[async_trait]
impl DecisionSource for Authority {
    /// Walk the policy listing, then search the facts for the derived
    /// `is_resident` fact. A query that does not parse is scanned
    /// against the raw text, which can never match -- "malformed means
    /// never authorized", not an error.
    async fn authorize(&self, query: &str) -> Decision {
        let my_gen = *self.cancel.borrow();
        let search = parse_query(query).map_or_else(
            || query.to_owned(),
            |parsed| format_fact("is_resident", &[parsed.actor, parsed.resource]),
        );

        let scannable = self
            .policy
            .iter()
            .filter(|line| line.content().is_some())
            .count();

        self.emit(AuthorityEvent::ScanStarted {
            target: ScanTarget::Policy,
        });

        // Every policy line before the last settles affirmative; the
        // last line is the one that consults the facts.
        for index in 0..scannable {
            self.emit(AuthorityEvent::LineFocused {
                target: ScanTarget::Policy,
                index,
            });
            if !self.step(self.config.policy_step_ms, my_gen).await {
                self.finish(ScanTarget::Policy, false);
                return Decision { authorized: false };
            }
            if index.saturating_add(1) < scannable {
                self.emit(AuthorityEvent::LineVerdict {
                    target: ScanTarget::Policy,
                    index,
                    matched: true,
                });
            }
        }

        let decision = self.search_for_fact(&search).await;

        if let Some(last) = scannable.checked_sub(1) {
            self.emit(AuthorityEvent::LineVerdict {
                target: ScanTarget::Policy,
                index: last,
                matched: decision.authorized,
            });
        }
        self.finish(ScanTarget::Policy, true);
        decision
    }

    fn cancel(&self) {
        self.cancel_scan();
    }
}

impl core::fmt::Debug for Authority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authority")
            .field("config", &self.config)
            .field("policy_lines", &self.policy.len())
            .finish_non_exhaustive()
    }
}
