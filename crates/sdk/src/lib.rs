//! # Fleet SDK
//!
//! Error taxonomy and external interfaces shared by the fleet tracker crates.

mod error;
mod provider;

pub use crate::error::*;
pub use crate::provider::*;
