use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use fleet_tracker::Config;

/// Where replayed location samples come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaySource {
    /// No location capability on this device.
    None,
    Stdin,
    File(PathBuf),
}

impl ReplaySource {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::None,
            Some("-") => Self::Stdin,
            Some(path) => Self::File(PathBuf::from(path)),
        }
    }
}

/// Render grid size in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSize {
    pub width: usize,
    pub height: usize,
}

impl Default for MapSize {
    fn default() -> Self {
        Self { width: 60, height: 20 }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tracker: Config,
    pub replay: ReplaySource,

    /// Delay before each replayed sample.
    pub replay_step: Duration,
    pub map: MapSize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = MapSize::default();

        Self {
            tracker: Config::from_lookup(&lookup),
            replay: ReplaySource::parse(lookup("FLEET_REPLAY").as_deref()),
            replay_step: Duration::from_millis(parse(&lookup, "FLEET_REPLAY_STEP_MS").unwrap_or(1_000)),
            map: MapSize {
                width: parse(&lookup, "FLEET_MAP_WIDTH").unwrap_or(defaults.width).max(2),
                height: parse(&lookup, "FLEET_MAP_HEIGHT").unwrap_or(defaults.height).max(2),
            },
        }
    }
}

fn parse<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn replay_source() {
        assert_eq!(ReplaySource::parse(None), ReplaySource::None);
        assert_eq!(ReplaySource::parse(Some("  ")), ReplaySource::None);
        assert_eq!(ReplaySource::parse(Some("-")), ReplaySource::Stdin);
        assert_eq!(
            ReplaySource::parse(Some("demos/drive.ndjson")),
            ReplaySource::File(PathBuf::from("demos/drive.ndjson"))
        );
    }

    #[test]
    fn defaults() {
        let config = lookup(&[]);
        assert_eq!(config.tracker, Config::default());
        assert_eq!(config.replay, ReplaySource::None);
        assert_eq!(config.replay_step, Duration::from_secs(1));
        assert_eq!(config.map, MapSize { width: 60, height: 20 });
    }

    #[test]
    fn reads_variables() {
        let config = lookup(&[
            ("FLEET_BASE_URL", "http://fleet.local/"),
            ("FLEET_REPLAY", "-"),
            ("FLEET_REPLAY_STEP_MS", "250"),
            ("FLEET_MAP_WIDTH", "80"),
            ("FLEET_MAP_HEIGHT", "24"),
        ]);
        assert_eq!(config.tracker.base_url, "http://fleet.local");
        assert_eq!(config.replay, ReplaySource::Stdin);
        assert_eq!(config.replay_step, Duration::from_millis(250));
        assert_eq!(config.map, MapSize { width: 80, height: 24 });
    }

    #[test]
    fn map_size_floor_and_fallback() {
        let config = lookup(&[("FLEET_MAP_WIDTH", "0"), ("FLEET_MAP_HEIGHT", "tall")]);
        assert_eq!(config.map, MapSize { width: 2, height: 20 });
    }
}
