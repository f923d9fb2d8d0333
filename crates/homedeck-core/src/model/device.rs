// ── Device domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::alert::Alert;
use super::state::DeviceState;

/// Stable, backend-issued device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Canonical device kind, normalized from the wire string.
///
/// Kinds outside the catalog survive as `Other` so unknown devices
/// still show up (read-only) instead of vanishing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    Light,
    Switch,
    Sensor,
    Thermostat,
    Lock,
    Cover,
    Motion,
    Door,
    Camera,
    Fan,
    #[strum(default, to_string = "{0}")]
    Other(String),
}

impl DeviceKind {
    /// Normalize a wire string into a canonical kind, preserving unknown
    /// kinds as `Other` so they still surface (read-only).
    pub fn from_wire(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| Self::Other(raw.to_owned()))
    }
}

impl Serialize for DeviceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Health metrics reported alongside a device. Each is independently
/// nullable -- most device classes report only a subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DeviceMetrics {
    pub battery: Option<f64>,
    pub link_quality: Option<u16>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl DeviceMetrics {
    /// Battery below the warning threshold the dashboards flag.
    pub fn battery_low(&self) -> bool {
        self.battery.is_some_and(|b| b < 20.0)
    }
}

/// The canonical client-side device record.
///
/// Owned exclusively by the [`DeviceRegistry`](crate::store::DeviceRegistry);
/// every other component works on `Arc` snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub kind: DeviceKind,
    /// Display name; falls back to the id when the backend omits one.
    pub name: String,
    pub room: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub online: bool,
    pub state: DeviceState,
    pub metrics: DeviceMetrics,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub update_count: u64,
    /// Replaced wholesale on every update; never mutated in place.
    pub alerts: Vec<Alert>,
}
