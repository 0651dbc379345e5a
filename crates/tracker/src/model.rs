//! Fleet entities and their wire representation.

use std::fmt::{self, Display};

use fleet_sdk::{Error, Result, Sample, invalid};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const UNKNOWN_NAME: &str = "Unknown Unit";

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Validate latitude is in [-90, 90] and longitude in [-180, 180].
    ///
    /// # Errors
    ///
    /// Returns a validation failure when either coordinate is out of range or
    /// not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid!("latitude {} out of range", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid!("longitude {} out of range", self.longitude));
        }
        Ok(())
    }
}

impl From<Sample> for Position {
    fn from(sample: Sample) -> Self {
        Self::new(sample.latitude, sample.longitude)
    }
}

/// Informational vehicle category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    Mobile,
    Fixed,
    #[default]
    #[serde(other)]
    Other,
}

impl Kind {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("mobile") {
            Self::Mobile
        } else if value.eq_ignore_ascii_case("fixed") {
            Self::Fixed
        } else {
            Self::Other
        }
    }
}

/// Server-reported status. Display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Idle,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Status {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("active") {
            Self::Active
        } else if value.eq_ignore_ascii_case("idle") {
            Self::Idle
        } else {
            Self::Unknown
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Idle => write!(f, "Idle"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Process-lifetime identifier of this device.
///
/// The `mobile-` prefix keeps it apart from ids assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    #[must_use]
    pub fn generate() -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self(format!("mobile-{}", &token[..9]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked vehicle or device.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub kind: Kind,
    pub position: Position,
    pub status: Status,
    pub speed_kmh: f64,
    pub battery_pct: u8,

    /// True only for the entity this client is transmitting as.
    pub is_self: bool,
}

impl Entity {
    /// Validate one element of a fleet listing.
    ///
    /// Only `id`, `lat` and `lng` are required; everything else falls back to
    /// a default.
    ///
    /// # Errors
    ///
    /// Returns a validation failure when the element is not an object, a
    /// required field is missing, or a coordinate is out of range.
    pub fn from_value(value: Value, device_id: &DeviceId) -> Result<Self> {
        let raw: RawVehicle = serde_json::from_value(value)?;

        let id = raw.id.filter(|id| !id.is_empty()).ok_or_else(|| invalid!("missing `id`"))?;
        let (Some(lat), Some(lng)) = (raw.lat, raw.lng) else {
            return Err(invalid!("missing position for {id}"));
        };
        let position = Position::new(lat, lng);
        position.validate().map_err(|e| match e {
            Error::ValidationFailure(reason) => invalid!("{id}: {reason}"),
            other => other,
        })?;

        Ok(Self {
            is_self: id == device_id.as_str(),
            id,
            name: raw.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            kind: raw.kind.as_deref().map(Kind::parse).unwrap_or_default(),
            position,
            status: raw.status.as_deref().map(Status::parse).unwrap_or_default(),
            speed_kmh: raw.speed.filter(|s| s.is_finite()).unwrap_or_default().max(0.0),
            battery_pct: battery(raw.battery),
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn battery(value: Option<f64>) -> u8 {
    value.filter(|b| b.is_finite()).map_or(0, |b| b.round().clamp(0.0, 100.0) as u8)
}

// Lenient view of a listing element, so one bad field fails only its entity.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVehicle {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    status: Option<String>,
    speed: Option<f64>,
    battery: Option<f64>,
}

/// Entity state exchanged with the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub lat: f64,
    pub lng: f64,
    pub status: Status,
    pub speed: f64,
    pub battery: u8,
    pub is_owner: bool,
}

impl Vehicle {
    /// Build the upsert for this device from a location sample.
    #[must_use]
    pub fn from_sample(device_id: &DeviceId, name: &str, sample: &Sample) -> Self {
        Self {
            id: device_id.to_string(),
            name: name.to_string(),
            kind: Kind::Mobile,
            lat: sample.latitude,
            lng: sample.longitude,
            status: Status::Active,
            speed: sample.speed_kmh(),
            battery: 100,
            is_owner: true,
        }
    }
}
