use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::cache::FleetCache;
use crate::model::Entity;

/// Last outcome of the transmit path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMessage {
    #[default]
    Idle,
    Transmitting,
    GpsDenied,
    UploadFailed,
}

impl Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Transmitting => write!(f, "Transmitting"),
            Self::GpsDenied => write!(f, "GPS Denied"),
            Self::UploadFailed => write!(f, "Upload Failed"),
        }
    }
}

/// Client-local view state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// May outlive the entity it refers to; see [`ViewState::selected`].
    pub selected_id: Option<String>,
    pub transmitting: bool,
    pub status: StatusMessage,
}

impl ViewState {
    pub fn select(&mut self, id: impl Into<String>) {
        self.selected_id = Some(id.into());
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
    }

    /// Resolve the selection against `cache`. A selection whose entity has
    /// since disappeared resolves to `None`.
    #[must_use]
    pub fn selected<'a>(&self, cache: &'a FleetCache) -> Option<&'a Entity> {
        self.selected_id.as_deref().and_then(|id| cache.get(id))
    }
}
