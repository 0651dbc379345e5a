use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::projection::DEFAULT_PADDING;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_DEVICE_NAME: &str = "Mobile Unit";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Tracker configuration derived from the host environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Store base URL, without a trailing slash.
    pub base_url: String,
    pub poll_interval: Duration,

    /// Padding, in degrees, added to each side of the fleet bounding box.
    pub padding: f64,
    pub device_name: String,

    /// Ask the store to drop the local entity when transmission stops.
    pub remove_on_disarm: bool,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset, unparseable, or
    /// out-of-range values fall back to the default.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_url = lookup("FLEET_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.base_url);
        let poll_interval = parse::<u64>(&lookup, "FLEET_POLL_INTERVAL_MS")
            .filter(|ms| *ms > 0)
            .map_or(defaults.poll_interval, Duration::from_millis);
        let padding = parse::<f64>(&lookup, "FLEET_MAP_PADDING")
            .filter(|value| value.is_finite() && *value >= 0.0)
            .unwrap_or(defaults.padding);
        let device_name = lookup("FLEET_DEVICE_NAME")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.device_name);
        let remove_on_disarm = lookup("FLEET_REMOVE_ON_DISARM").map_or(defaults.remove_on_disarm, |value| {
            matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        });

        Self { base_url, poll_interval, padding, device_name, remove_on_disarm }
    }

    #[must_use]
    pub fn vehicles_url(&self) -> String {
        format!("{}/api/vehicles", self.base_url)
    }

    #[must_use]
    pub fn update_url(&self) -> String {
        format!("{}/api/update", self.base_url)
    }

    #[must_use]
    pub fn remove_url(&self, id: &str) -> String {
        format!("{}/api/remove/{id}", self.base_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            padding: DEFAULT_PADDING,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            remove_on_disarm: false,
        }
    }
}

fn parse<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}
