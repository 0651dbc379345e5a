//! # Observer
//!
//! Named outcomes of the synchronization paths. Most of them do not change
//! control flow; they exist so that tests and operators can see what the
//! tracker decided.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::transmitter::SubscriptionId;

/// Something the tracker decided while applying an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A poll response replaced the cache.
    CacheReplaced { seq: u64, kept: usize, dropped: usize },

    /// An element of a poll response was dropped.
    ValidationFailure { seq: u64, index: usize, reason: String },

    /// A poll response arrived after a newer one was already applied.
    StaleResponseDiscarded { seq: u64, latest: u64 },

    PollFailed { seq: u64, reason: String },
    PushSucceeded { subscription: SubscriptionId },
    PushFailed { subscription: SubscriptionId, reason: String },

    /// A push result for a subscription that is no longer active.
    StalePushIgnored { subscription: SubscriptionId },

    /// A location sample with out-of-range or non-finite coordinates.
    InvalidSample { subscription: SubscriptionId, reason: String },

    /// A sample or denial for a subscription that is no longer active.
    StaleSampleIgnored { subscription: SubscriptionId },

    LocationDenied { subscription: SubscriptionId, reason: String },
    Armed { subscription: SubscriptionId },
    Disarmed,
}

/// Receives every [`Outcome`].
pub trait Observer: Send + Sync {
    fn observe(&self, outcome: &Outcome);
}

/// Logs outcomes with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, outcome: &Outcome) {
        match outcome {
            Outcome::CacheReplaced { seq, kept, dropped } => {
                debug!(monotonic_counter.polls_applied = 1, seq, kept, dropped, "fleet cache replaced");
            }
            Outcome::ValidationFailure { seq, index, reason } => {
                warn!(monotonic_counter.invalid_entities = 1, seq, index, reason = %reason, "dropped invalid entity");
            }
            Outcome::StaleResponseDiscarded { seq, latest } => {
                debug!(monotonic_counter.stale_responses_discarded = 1, seq, latest, "discarded stale poll response");
            }
            Outcome::PollFailed { seq, reason } => {
                warn!(monotonic_counter.poll_failures = 1, seq, error = %reason, "fleet poll failed");
            }
            Outcome::PushSucceeded { subscription } => {
                debug!(monotonic_counter.pushes_sent = 1, %subscription, "position pushed");
            }
            Outcome::PushFailed { subscription, reason } => {
                warn!(monotonic_counter.push_failures = 1, %subscription, error = %reason, "position push failed");
            }
            Outcome::StalePushIgnored { subscription } => {
                debug!(monotonic_counter.stale_pushes_ignored = 1, %subscription, "ignored push result from inactive subscription");
            }
            Outcome::InvalidSample { subscription, reason } => {
                warn!(monotonic_counter.invalid_samples = 1, %subscription, reason = %reason, "skipped invalid location sample");
            }
            Outcome::StaleSampleIgnored { subscription } => {
                debug!(monotonic_counter.stale_samples_ignored = 1, %subscription, "ignored location event from inactive subscription");
            }
            Outcome::LocationDenied { subscription, reason } => {
                warn!(%subscription, reason = %reason, "location denied");
            }
            Outcome::Armed { subscription } => info!(%subscription, "transmitter armed"),
            Outcome::Disarmed => info!("transmitter disarmed"),
        }
    }
}

/// Keeps every outcome in memory as well as logging it.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    outcomes: Arc<Mutex<Vec<Outcome>>>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes observed so far, oldest first.
    #[must_use]
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of observed outcomes matching `pred`.
    pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner).iter().filter(|o| pred(o)).count()
    }
}

impl Observer for Recorder {
    fn observe(&self, outcome: &Outcome) {
        TracingObserver.observe(outcome);
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner).push(outcome.clone());
    }
}
