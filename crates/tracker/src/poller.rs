//! # Fleet Poller
//!
//! Fetches the fleet listing on a fixed interval. Requests are not serialized:
//! a slow request may still be in flight when the next tick fires, so every
//! request is tagged with a sequence number and only responses newer than the
//! last applied one may touch the cache.

use std::sync::Arc;
use std::time::Duration;

use fleet_sdk::HttpRequest;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};

use crate::api;
use crate::config::Config;
use crate::state::Event;

// `time::interval` rejects a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Orders poll responses by dispatch sequence.
#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    latest: u64,
}

impl Sequencer {
    /// Accept `seq` if it is newer than every response applied so far.
    /// Otherwise returns the latest applied sequence.
    pub(crate) const fn accept(&mut self, seq: u64) -> Result<(), u64> {
        if seq <= self.latest {
            return Err(self.latest);
        }
        self.latest = seq;
        Ok(())
    }
}

/// Poll the store until the session queue closes. The first request goes out
/// immediately.
///
/// Dropping (or aborting) the returned future cancels the timer and every
/// request still in flight.
pub(crate) async fn run<P>(provider: P, config: Arc<Config>, queue: mpsc::UnboundedSender<Event>)
where
    P: HttpRequest + Clone + 'static,
{
    let mut ticker = time::interval(config.poll_interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight = JoinSet::new();
    let mut seq = 0;

    while !queue.is_closed() {
        tokio::select! {
            _ = ticker.tick() => {
                seq += 1;
                let provider = provider.clone();
                let config = Arc::clone(&config);
                let queue = queue.clone();

                in_flight.spawn(async move {
                    let result = api::vehicles(&provider, &config).await;
                    let _ = queue.send(Event::Fleet { seq, result });
                });
            }
            Some(_) = in_flight.join_next() => {}
        }
    }
}
