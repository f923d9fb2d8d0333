//! Wire shapes shared by the REST client and the push channel.
//!
//! Two backend profiles feed the same dashboards: the device simulator
//! (per-entity events, `id`/`type` field names) and the health monitor
//! (full snapshots, `device_id`/`device_type` field names). The record
//! types here accept both spellings so one decode path serves both.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Device records ───────────────────────────────────────────────────

/// A device exactly as the backend ships it.
///
/// `state` stays an untyped JSON map at this layer; `homedeck-core`
/// decodes it against the device-type schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(alias = "device_id")]
    pub id: String,

    #[serde(rename = "type", alias = "device_type")]
    pub kind: String,

    /// Display name. The health monitor omits it; consumers fall back
    /// to the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub online: bool,

    #[serde(default)]
    pub state: serde_json::Map<String, Value>,

    // ── Health metrics (each independently nullable) ─────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_quality: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,

    // ── Lifecycle ────────────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,

    #[serde(default, alias = "last_update", skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,

    #[serde(default)]
    pub update_count: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<AlertRecord>,
}

/// One alert attached to a device record. The backend replaces the
/// alert list wholesale on each update; alerts are never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Body for `POST /api/devices` and `PUT /api/devices/{id}`.
///
/// The id is optional on create (the backend generates one) and fixed
/// on replace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default)]
    pub state: serde_json::Map<String, Value>,
}

// ── Device-type catalog ──────────────────────────────────────────────

/// One entry of `GET /api/device-types`.
///
/// The JSON type of each `default_state` value fixes the expected type
/// of that field for every device of the kind. Declaration order is
/// preserved so generic state rendering stays stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTypeDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub icon: String,
    pub default_state: IndexMap<String, Value>,
}

// ── Push protocol ────────────────────────────────────────────────────

/// A decoded push-channel frame.
///
/// One tagged enum covers both wire profiles: per-entity deltas from
/// the simulator and full snapshots from the health monitor. Nothing
/// stops a deployment from mixing both on one channel, so consumers
/// must handle all variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    DeviceCreated { device: DeviceRecord },
    DeviceUpdated { device: DeviceRecord },
    StateUpdated { device: DeviceRecord },
    DeviceDeleted { device_id: String },
    Initial { data: SnapshotData },
    Update { data: SnapshotData },
}

/// Payload of the snapshot-style frames (`initial` / `update`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub devices: HashMap<String, DeviceRecord>,
    #[serde(default)]
    pub total_devices: u64,
    #[serde(default)]
    pub online_devices: u64,
    #[serde(default)]
    pub offline_devices: u64,
    #[serde(default)]
    pub battery_warnings: u64,
}

// ── Import/export ────────────────────────────────────────────────────

/// Response of `POST /api/devices/import`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: u64,
    pub skipped: u64,
}

// ── Tests ────────────────────────────────────────────────────────────
