//! # Position Transmitter
//!
//! Streams this device's location upstream while armed. Every location watch
//! gets a [`SubscriptionId`]; samples, denials and push results carry the id
//! of the watch they came from and are dropped once that watch is no longer
//! the active one.

use std::fmt::{self, Display};

use fleet_sdk::{HttpRequest, LocationEvent};
use tokio::sync::mpsc;

use crate::api;
use crate::config::Config;
use crate::model::Vehicle;
use crate::state::Event;

/// Identity of one arm cycle's location watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Transmitter {
    issued: u64,
    active: Option<SubscriptionId>,
}

impl Transmitter {
    /// Start a new subscription, replacing any active one.
    pub(crate) const fn arm(&mut self) -> SubscriptionId {
        self.issued += 1;
        let subscription = SubscriptionId(self.issued);
        self.active = Some(subscription);
        subscription
    }

    /// End the active subscription, if any.
    pub(crate) const fn disarm(&mut self) -> Option<SubscriptionId> {
        self.active.take()
    }

    pub(crate) fn is_active(&self, subscription: SubscriptionId) -> bool {
        self.active == Some(subscription)
    }

    pub(crate) const fn active(&self) -> Option<SubscriptionId> {
        self.active
    }
}

/// Feed a location watch into the session queue until it ends, is denied, or
/// the session goes away.
pub(crate) async fn forward(
    subscription: SubscriptionId, mut events: mpsc::Receiver<LocationEvent>,
    queue: mpsc::UnboundedSender<Event>,
) {
    while let Some(event) = events.recv().await {
        let event = match event {
            LocationEvent::Sample(sample) => Event::Sample { subscription, sample },
            LocationEvent::Denied(reason) => {
                let _ = queue.send(Event::LocationDenied { subscription, reason });
                return;
            }
        };
        if queue.send(event).is_err() {
            return;
        }
    }
}

/// Push one sample and turn the result into an event for the same
/// subscription.
pub(crate) async fn push<P: HttpRequest>(
    provider: &P, config: &Config, subscription: SubscriptionId, vehicle: &Vehicle,
) -> Event {
    let result = api::update(provider, config, vehicle).await;
    Event::Pushed { subscription, result }
}
