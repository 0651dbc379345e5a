//! # Fleet Tracker
//!
//! Keeps a local snapshot of a fleet's positions in sync with a remote store,
//! optionally streams this device's own position upstream, and projects all
//! known positions onto a normalized 2-D viewport.
//!
//! All state lives in a single [`State`] owned by a [`Session`]. The poller
//! timer, the location watch, and user commands feed one event queue that is
//! processed strictly in arrival order.

mod api;
mod cache;
mod config;
mod model;
mod observer;
mod poller;
mod projection;
mod session;
mod state;
mod transmitter;
mod view;

pub use fleet_sdk::{Error, Result};

pub use crate::api::*;
pub use crate::cache::FleetCache;
pub use crate::config::Config;
pub use crate::model::*;
pub use crate::observer::*;
pub use crate::projection::*;
pub use crate::session::*;
pub use crate::state::*;
pub use crate::transmitter::SubscriptionId;
pub use crate::view::*;
