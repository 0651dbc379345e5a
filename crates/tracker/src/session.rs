//! # Session
//!
//! Owns the tracker state and runs its event loop. The poller timer, the
//! location watch, push completions and user commands all arrive on one
//! queue and are applied strictly in arrival order.
//!
//! Stopping the session (via [`SessionHandle::shutdown`] or by dropping it)
//! cancels the poll timer and unsubscribes the location watch.

use std::sync::Arc;

use fleet_sdk::{Error, Provider, Result, Subscription, WatchId};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::model::DeviceId;
use crate::observer::Observer;
use crate::state::{Action, Command, Event, Snapshot, State};
use crate::transmitter::{self, SubscriptionId};
use crate::{api, poller};

struct ActiveWatch {
    subscription: SubscriptionId,
    id: WatchId,
    task: JoinHandle<()>,
}

/// A running tracker bound to one provider.
pub struct Session<P: Provider> {
    provider: P,
    config: Arc<Config>,
    state: State,

    queue: mpsc::UnboundedSender<Event>,
    events: mpsc::UnboundedReceiver<Event>,
    snapshots: watch::Sender<Snapshot>,

    poller: Option<JoinHandle<()>>,
    watch: Option<ActiveWatch>,
    in_flight: JoinSet<()>,
}

impl<P: Provider> Session<P> {
    /// Create a session with a freshly generated device id.
    #[must_use]
    pub fn new(provider: P, config: Config) -> Self {
        Self::with_device_id(provider, config, DeviceId::generate())
    }

    #[must_use]
    pub fn with_device_id(provider: P, config: Config, device_id: DeviceId) -> Self {
        let state = State::new(&config, device_id);
        let (queue, events) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(state.snapshot());

        Self {
            provider,
            config: Arc::new(config),
            state,
            queue,
            events,
            snapshots,
            poller: None,
            watch: None,
            in_flight: JoinSet::new(),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl Observer + 'static) -> Self {
        self.state.set_observer(observer);
        self
    }

    /// A cloneable handle for issuing commands and reading snapshots.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle { queue: self.queue.clone(), snapshots: self.snapshots.subscribe() }
    }

    #[must_use]
    pub const fn device_id(&self) -> &DeviceId {
        self.state.device_id()
    }

    /// Run until shut down.
    pub async fn run(mut self) {
        self.start();

        loop {
            tokio::select! {
                Some(event) = self.events.recv() => {
                    if matches!(event, Event::Command(Command::Shutdown)) {
                        break;
                    }
                    for action in self.state.apply(event) {
                        self.execute(action);
                    }
                    self.snapshots.send_replace(self.state.snapshot());
                }
                Some(_) = self.in_flight.join_next() => {}
            }
        }

        self.stop();
    }

    fn start(&mut self) {
        info!(device_id = %self.state.device_id(), base_url = %self.config.base_url, "session started");

        let task = poller::run(self.provider.clone(), Arc::clone(&self.config), self.queue.clone());
        self.poller = Some(tokio::spawn(task));
    }

    fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        if let Some(active) = self.watch.take() {
            self.end_watch(active);
        }
        self.in_flight.abort_all();
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::Subscribe(subscription) => self.subscribe(subscription),
            Action::Unsubscribe(subscription) => {
                if let Some(active) = self.watch.take_if(|w| w.subscription == subscription) {
                    self.end_watch(active);
                }
            }
            Action::Push { subscription, vehicle } => {
                let provider = self.provider.clone();
                let config = Arc::clone(&self.config);
                let queue = self.queue.clone();

                self.in_flight.spawn(async move {
                    let event = transmitter::push(&provider, &config, subscription, &vehicle).await;
                    let _ = queue.send(event);
                });
            }
            Action::Remove(id) => {
                let provider = self.provider.clone();
                let config = Arc::clone(&self.config);

                self.in_flight.spawn(async move {
                    match api::remove(&provider, &config, &id).await {
                        Ok(()) => info!(monotonic_counter.removals = 1, id = %id, "removed from store"),
                        Err(e) => warn!(error = %e, id = %id, "failed to remove from store"),
                    }
                });
            }
        }
    }

    fn subscribe(&mut self, subscription: SubscriptionId) {
        if let Some(previous) = self.watch.take() {
            self.end_watch(previous);
        }

        match self.provider.subscribe() {
            Ok(Subscription { id, events }) => {
                debug!(%subscription, watch = id.0, "location watch started");
                let task = tokio::spawn(transmitter::forward(subscription, events, self.queue.clone()));
                self.watch = Some(ActiveWatch { subscription, id, task });
            }
            Err(e) => {
                let err = Error::LocationDenied(format!("{e:#}"));
                warn!(code = err.code(), %subscription, error = %err, "location watch unavailable");
                let reason = err.description().to_string();
                let _ = self.queue.send(Event::LocationDenied { subscription, reason });
            }
        }
    }

    fn end_watch(&self, active: ActiveWatch) {
        debug!(subscription = %active.subscription, watch = active.id.0, "location watch stopped");
        self.provider.unsubscribe(active.id);
        active.task.abort();
    }
}

impl<P: Provider> Drop for Session<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Commands and snapshots for a running [`Session`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    queue: mpsc::UnboundedSender<Event>,
    snapshots: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    /// Start transmitting this device's position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] when the session is no longer running.
    pub fn arm(&self) -> Result<()> {
        self.send(Command::Arm)
    }

    /// Stop transmitting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] when the session is no longer running.
    pub fn disarm(&self) -> Result<()> {
        self.send(Command::Disarm)
    }

    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] when the session is no longer running.
    pub fn toggle(&self) -> Result<()> {
        self.send(Command::Toggle)
    }

    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] when the session is no longer running.
    pub fn select(&self, id: impl Into<String>) -> Result<()> {
        self.send(Command::Select(Some(id.into())))
    }

    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] when the session is no longer running.
    pub fn clear_selection(&self) -> Result<()> {
        self.send(Command::Select(None))
    }

    /// Stop the session. Events already queued ahead of the shutdown are
    /// still applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] when the session is no longer running.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified on every change.
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    fn send(&self, command: Command) -> Result<()> {
        if self.queue.send(command.into()).is_err() {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }
}
