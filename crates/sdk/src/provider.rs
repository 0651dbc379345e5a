//! # Provider
//!
//! Provider defines external data interfaces for the tracker: the remote
//! store (over HTTP) and the device location capability.

use anyhow::Result;
use bytes::Bytes;
use http::{Request, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Provider entry point implemented by the host application.
pub trait Provider: HttpRequest + Location + Clone + 'static {}

/// The `HttpRequest` trait defines the behavior for talking to the remote
/// store.
pub trait HttpRequest: Send + Sync {
    /// Make outbound HTTP request.
    ///
    /// Transport errors are returned as `Err`; any response from the store,
    /// successful or not, is returned as `Ok` for the caller to interpret.
    fn fetch(
        &self, request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

/// The `Location` trait is the device location capability.
pub trait Location: Send + Sync {
    /// Start a continuous location watch.
    ///
    /// An `Err` means the capability is not present on this device. A
    /// capability that is present but refuses access reports
    /// [`LocationEvent::Denied`] on the returned stream instead.
    ///
    /// # Errors
    ///
    /// Returns an error when no location capability is available.
    fn subscribe(&self) -> Result<Subscription>;

    /// Stop the watch identified by `id`. Unknown ids are ignored.
    fn unsubscribe(&self, id: WatchId);
}

/// Identifies a location watch registered with the capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// A live location watch.
#[derive(Debug)]
pub struct Subscription {
    pub id: WatchId,
    pub events: mpsc::Receiver<LocationEvent>,
}

/// Emitted by a location watch.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Sample(Sample),
    Denied(String),
}

/// A single raw location sample from the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub latitude: f64,
    pub longitude: f64,

    /// Ground speed in m/s, when the sensor reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl Sample {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, speed: None }
    }

    #[must_use]
    pub const fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Speed converted from m/s to whole km/h; zero when the sensor omitted it.
    #[must_use]
    pub fn speed_kmh(&self) -> f64 {
        (self.speed.unwrap_or_default() * 3.6).round().max(0.0)
    }
}
