//! # State
//!
//! The single consumer of the session queue. [`State::apply`] handles one
//! event to completion and returns the I/O the runtime should start; it never
//! performs I/O itself, which keeps every ordering rule testable without a
//! timer, a sensor, or a network.

use chrono::{DateTime, Utc};
use fleet_sdk::{Result, Sample};
use serde_json::Value;

use crate::cache::FleetCache;
use crate::config::Config;
use crate::model::{DeviceId, Entity, Position, Vehicle};
use crate::observer::{Observer, Outcome, TracingObserver};
use crate::poller::Sequencer;
use crate::projection::{Bounds, Point};
use crate::transmitter::{SubscriptionId, Transmitter};
use crate::view::{StatusMessage, ViewState};

/// User intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Arm,
    Disarm,
    Toggle,
    Select(Option<String>),
    Shutdown,
}

/// Input to the session queue.
#[derive(Debug, Clone)]
pub enum Event {
    /// Result of the poll request dispatched with `seq`.
    Fleet { seq: u64, result: Result<Vec<Value>> },
    Sample { subscription: SubscriptionId, sample: Sample },
    LocationDenied { subscription: SubscriptionId, reason: String },
    Pushed { subscription: SubscriptionId, result: Result<()> },
    Command(Command),
}

impl From<Command> for Event {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

/// I/O requested by [`State::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Start a location watch for `subscription`.
    Subscribe(SubscriptionId),
    /// Stop the location watch for `subscription`.
    Unsubscribe(SubscriptionId),
    Push { subscription: SubscriptionId, vehicle: Vehicle },
    /// Best-effort removal of an entity from the store.
    Remove(String),
}

/// Fleet cache and view state, owned by one session.
pub struct State {
    device_id: DeviceId,
    device_name: String,
    padding: f64,
    remove_on_disarm: bool,

    cache: FleetCache,
    bounds: Bounds,
    view: ViewState,
    refreshed_at: Option<DateTime<Utc>>,

    sequencer: Sequencer,
    transmitter: Transmitter,
    observer: Box<dyn Observer>,
}

impl State {
    #[must_use]
    pub fn new(config: &Config, device_id: DeviceId) -> Self {
        Self {
            device_id,
            device_name: config.device_name.clone(),
            padding: config.padding,
            remove_on_disarm: config.remove_on_disarm,
            cache: FleetCache::new(),
            bounds: Bounds::UNIT,
            view: ViewState::default(),
            refreshed_at: None,
            sequencer: Sequencer::default(),
            transmitter: Transmitter::default(),
            observer: Box::new(TracingObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl Observer + 'static) -> Self {
        self.set_observer(observer);
        self
    }

    pub fn set_observer(&mut self, observer: impl Observer + 'static) {
        self.observer = Box::new(observer);
    }

    /// Apply one event and return the I/O it calls for.
    pub fn apply(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::Fleet { seq, result } => {
                self.on_fleet(seq, result);
                vec![]
            }
            Event::Sample { subscription, sample } => self.on_sample(subscription, &sample),
            Event::LocationDenied { subscription, reason } => self.on_denied(subscription, reason),
            Event::Pushed { subscription, result } => {
                self.on_pushed(subscription, result);
                vec![]
            }
            Event::Command(command) => self.on_command(command),
        }
    }

    fn on_fleet(&mut self, seq: u64, result: Result<Vec<Value>>) {
        let listing = match result {
            Ok(listing) => listing,
            Err(e) => {
                self.observer.observe(&Outcome::PollFailed { seq, reason: e.description().to_string() });
                return;
            }
        };

        if let Err(latest) = self.sequencer.accept(seq) {
            self.observer.observe(&Outcome::StaleResponseDiscarded { seq, latest });
            return;
        }

        let total = listing.len();
        let mut entities = Vec::with_capacity(total);
        for (index, value) in listing.into_iter().enumerate() {
            match Entity::from_value(value, &self.device_id) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    let reason = e.description().to_string();
                    self.observer.observe(&Outcome::ValidationFailure { seq, index, reason });
                }
            }
        }

        let kept = entities.len();
        let dropped = total - kept;
        self.cache.replace(entities);
        self.bounds = Bounds::fit(self.cache.iter().map(|e| e.position), self.padding);
        self.refreshed_at = Some(Utc::now());

        self.observer.observe(&Outcome::CacheReplaced { seq, kept, dropped });
    }

    fn on_sample(&self, subscription: SubscriptionId, sample: &Sample) -> Vec<Action> {
        if !self.transmitter.is_active(subscription) {
            self.observer.observe(&Outcome::StaleSampleIgnored { subscription });
            return vec![];
        }
        if let Err(e) = Position::from(*sample).validate() {
            let reason = e.description().to_string();
            self.observer.observe(&Outcome::InvalidSample { subscription, reason });
            return vec![];
        }
        let vehicle = Vehicle::from_sample(&self.device_id, &self.device_name, sample);
        vec![Action::Push { subscription, vehicle }]
    }

    fn on_denied(&mut self, subscription: SubscriptionId, reason: String) -> Vec<Action> {
        if !self.transmitter.is_active(subscription) {
            self.observer.observe(&Outcome::StaleSampleIgnored { subscription });
            return vec![];
        }

        // stays "transmitting" until the user disarms; re-arming starts over
        self.transmitter.disarm();
        self.view.status = StatusMessage::GpsDenied;
        self.observer.observe(&Outcome::LocationDenied { subscription, reason });
        vec![Action::Unsubscribe(subscription)]
    }

    fn on_pushed(&mut self, subscription: SubscriptionId, result: Result<()>) {
        if !self.transmitter.is_active(subscription) {
            self.observer.observe(&Outcome::StalePushIgnored { subscription });
            return;
        }

        match result {
            Ok(()) => {
                self.view.status = StatusMessage::Transmitting;
                self.observer.observe(&Outcome::PushSucceeded { subscription });
            }
            Err(e) => {
                self.view.status = StatusMessage::UploadFailed;
                self.observer.observe(&Outcome::PushFailed { subscription, reason: e.description().to_string() });
            }
        }
    }

    fn on_command(&mut self, command: Command) -> Vec<Action> {
        match command {
            Command::Arm => self.arm(),
            Command::Disarm => self.disarm(),
            Command::Toggle if self.view.transmitting => self.disarm(),
            Command::Toggle => self.arm(),
            Command::Select(Some(id)) => {
                self.view.select(id);
                vec![]
            }
            Command::Select(None) => {
                self.view.clear_selection();
                vec![]
            }
            Command::Shutdown => vec![],
        }
    }

    fn arm(&mut self) -> Vec<Action> {
        if self.transmitter.active().is_some() {
            return vec![];
        }
        let subscription = self.transmitter.arm();
        self.view.transmitting = true;
        self.observer.observe(&Outcome::Armed { subscription });
        vec![Action::Subscribe(subscription)]
    }

    fn disarm(&mut self) -> Vec<Action> {
        let was_transmitting = self.view.transmitting;
        self.view.transmitting = false;
        self.view.status = StatusMessage::Idle;

        let mut actions = vec![];
        if let Some(subscription) = self.transmitter.disarm() {
            actions.push(Action::Unsubscribe(subscription));
        }
        if was_transmitting {
            self.observer.observe(&Outcome::Disarmed);
            if self.remove_on_disarm {
                actions.push(Action::Remove(self.device_id.to_string()));
            }
        }
        actions
    }

    /// The active subscription, if the transmitter is armed and not denied.
    #[must_use]
    pub const fn subscription(&self) -> Option<SubscriptionId> {
        self.transmitter.active()
    }

    #[must_use]
    pub const fn cache(&self) -> &FleetCache {
        &self.cache
    }

    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub const fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    #[must_use]
    pub const fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// The selected entity, or `None` when nothing is selected or the
    /// selection no longer exists.
    #[must_use]
    pub fn selected(&self) -> Option<&Entity> {
        self.view.selected(&self.cache)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entities: self.cache.entities().to_vec(),
            bounds: self.bounds,
            view: self.view.clone(),
            device_id: self.device_id.clone(),
            refreshed_at: self.refreshed_at,
        }
    }
}

/// Immutable copy of the state for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// In the order the store listed them.
    pub entities: Vec<Entity>,
    pub bounds: Bounds,
    pub view: ViewState,
    pub device_id: DeviceId,

    /// When the cache was last replaced.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    #[must_use]
    pub fn project(&self, position: Position) -> Point {
        self.bounds.project(position)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Entity> {
        let id = self.view.selected_id.as_deref()?;
        self.entities.iter().find(|e| e.id == id)
    }
}
