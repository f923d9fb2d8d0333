// ── Wire → domain conversion ──
//
// Schema-driven decoding of raw device records into typed domain
// records. Data errors are handled permissively: missing fields take
// the template default, unknown fields are dropped, type-mismatched
// values fall back to the default. Every fallback logs a warning, none
// of them fails the decode -- the dashboard stays live on bad data.

use std::str::FromStr;

use serde_json::Value;
use tracing::warn;

use homedeck_api::types::{AlertRecord, DeviceRecord, PushMessage, SnapshotData};

use crate::model::{
    Alert, AlertSeverity, ContactState, CoverState, Device, DeviceId, DeviceKind, DeviceMetrics,
    DeviceState, FanSpeed, FleetStats, LockState, PowerState, RegistryEvent, ThermostatMode,
};
use crate::schema::{FieldKind, SchemaRegistry, TypeSchema};

// ── Push message routing ─────────────────────────────────────────────

/// Decode one push message into a registry event.
pub fn event_from_push(message: &PushMessage, schemas: &SchemaRegistry) -> RegistryEvent {
    match message {
        PushMessage::DeviceCreated { device } => {
            RegistryEvent::Created(device_from_record(device, schemas))
        }
        PushMessage::DeviceUpdated { device } => {
            RegistryEvent::Updated(device_from_record(device, schemas))
        }
        PushMessage::StateUpdated { device } => {
            RegistryEvent::StateChanged(device_from_record(device, schemas))
        }
        PushMessage::DeviceDeleted { device_id } => {
            RegistryEvent::Deleted(DeviceId::new(device_id.clone()))
        }
        PushMessage::Initial { data } | PushMessage::Update { data } => resync_from_snapshot(data, schemas),
    }
}

/// Decode a full-snapshot frame into a resync event.
pub fn resync_from_snapshot(data: &SnapshotData, schemas: &SchemaRegistry) -> RegistryEvent {
    let devices = data
        .devices
        .values()
        .map(|record| device_from_record(record, schemas))
        .collect();

    RegistryEvent::Resync {
        devices,
        stats: FleetStats {
            total_devices: data.total_devices,
            online_devices: data.online_devices,
            offline_devices: data.offline_devices,
            battery_warnings: data.battery_warnings,
        },
    }
}

// ── Record decoding ──────────────────────────────────────────────────

/// Decode one wire record into the canonical domain record.
pub fn device_from_record(record: &DeviceRecord, schemas: &SchemaRegistry) -> Device {
    let kind = DeviceKind::from_wire(record.kind.as_str());
    let schema = schemas.get(&kind);

    let state = state_from_wire(&kind, &record.state, schema.as_deref(), &record.id);

    Device {
        name: record
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&record.id)
            .to_owned(),
        id: DeviceId::new(record.id.clone()),
        kind,
        room: non_empty(record.room.as_deref()),
        manufacturer: non_empty(record.manufacturer.as_deref()),
        model: non_empty(record.model.as_deref()),
        online: record.online,
        state,
        metrics: DeviceMetrics {
            battery: record.battery,
            link_quality: record.link_quality,
            temperature: record.temperature,
            humidity: record.humidity,
        },
        first_seen: record.first_seen,
        last_seen: record.last_seen,
        update_count: record.update_count,
        alerts: record.alerts.iter().map(alert_from_record).collect(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

fn alert_from_record(record: &AlertRecord) -> Alert {
    Alert {
        kind: record.kind.clone(),
        // Anything the catalog doesn't know is downgraded, not dropped.
        severity: record
            .severity
            .parse()
            .unwrap_or(AlertSeverity::Warning),
        message: record.message.clone(),
        timestamp: record.timestamp,
    }
}

// ── State decoding ───────────────────────────────────────────────────

/// Semantic fields each kind's decoder consumes beyond its template
/// (the light template omits `color`, which only color-capable lights
/// carry).
fn extra_known_fields(kind: &DeviceKind) -> &'static [&'static str] {
    match kind {
        DeviceKind::Light => &["color"],
        _ => &[],
    }
}

/// Build the typed state variant for `kind` from the raw field map.
pub fn state_from_wire(
    kind: &DeviceKind,
    raw: &serde_json::Map<String, Value>,
    schema: Option<&TypeSchema>,
    device_id: &str,
) -> DeviceState {
    // Unknown kinds keep their raw map; there is nothing to validate
    // against.
    if matches!(kind, DeviceKind::Other(_)) {
        return DeviceState::Generic(raw.clone());
    }

    // State keys must stay a subset of the template keys. Extra fields
    // are dropped here, not stored.
    if let Some(schema) = schema {
        for field in raw.keys() {
            if !schema.default_state.contains_key(field)
                && !extra_known_fields(kind).contains(&field.as_str())
            {
                warn!(device = device_id, field, "dropping unknown state field");
            }
        }
    }

    let fields = Fields {
        raw,
        schema,
        device_id,
    };

    match kind {
        DeviceKind::Light => DeviceState::Light {
            power: fields.parsed("state", PowerState::Off),
            brightness: fields.number("brightness", 100.0),
            color: fields.optional_text("color"),
        },
        DeviceKind::Switch => DeviceState::Switch {
            power: fields.parsed("state", PowerState::Off),
        },
        DeviceKind::Sensor => DeviceState::Sensor {
            temperature: fields.number("temperature", 20.0),
            humidity: fields.number("humidity", 50.0),
        },
        DeviceKind::Thermostat => DeviceState::Thermostat {
            mode: fields.parsed("mode", ThermostatMode::Heat),
            current_temperature: fields.number("current_temperature", 20.0),
            target_temperature: fields.number("target_temperature", 22.0),
            fan_mode: fields.optional_text("fan_mode"),
        },
        DeviceKind::Lock => DeviceState::Lock {
            state: fields.parsed("state", LockState::Locked),
        },
        DeviceKind::Cover => DeviceState::Cover {
            state: fields.parsed("state", CoverState::Closed),
            position: fields.number("position", 0.0),
        },
        DeviceKind::Motion => DeviceState::Motion {
            motion: fields.boolean("motion", false),
        },
        DeviceKind::Door => DeviceState::Door {
            contact: fields.parsed("contact", ContactState::Closed),
        },
        DeviceKind::Camera => DeviceState::Camera {
            activity: fields.text("state", "idle"),
            recording: fields.boolean("recording", false),
        },
        DeviceKind::Fan => DeviceState::Fan {
            power: fields.parsed("state", PowerState::Off),
            speed: fields.parsed("speed", FanSpeed::Medium),
        },
        DeviceKind::Other(_) => unreachable!("handled above"),
    }
}

/// Field reader resolving each value as: wire value of the expected
/// type, else template default, else the hard default.
struct Fields<'a> {
    raw: &'a serde_json::Map<String, Value>,
    schema: Option<&'a TypeSchema>,
    device_id: &'a str,
}

impl Fields<'_> {
    fn template_default(&self, field: &str) -> Option<&Value> {
        self.schema.and_then(|s| s.default_for(field))
    }

    fn mismatch(&self, field: &str, expected: FieldKind) {
        warn!(
            device = self.device_id,
            field,
            ?expected,
            "state field has wrong type, using default"
        );
    }

    fn text(&self, field: &str, fallback: &str) -> String {
        if let Some(value) = self.raw.get(field) {
            if let Some(text) = value.as_str() {
                return text.to_owned();
            }
            self.mismatch(field, FieldKind::Text);
        }
        self.template_default(field)
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_owned()
    }

    fn optional_text(&self, field: &str) -> Option<String> {
        if let Some(value) = self.raw.get(field) {
            if let Some(text) = value.as_str() {
                return Some(text.to_owned());
            }
            self.mismatch(field, FieldKind::Text);
        }
        self.template_default(field)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    fn number(&self, field: &str, fallback: f64) -> f64 {
        if let Some(value) = self.raw.get(field) {
            if let Some(n) = value.as_f64() {
                return n;
            }
            self.mismatch(field, FieldKind::Number);
        }
        self.template_default(field)
            .and_then(Value::as_f64)
            .unwrap_or(fallback)
    }

    fn boolean(&self, field: &str, fallback: bool) -> bool {
        if let Some(value) = self.raw.get(field) {
            if let Some(b) = value.as_bool() {
                return b;
            }
            self.mismatch(field, FieldKind::Bool);
        }
        self.template_default(field)
            .and_then(Value::as_bool)
            .unwrap_or(fallback)
    }

    /// Enum field: decode the text, fall back on unknown values.
    fn parsed<T>(&self, field: &str, fallback: T) -> T
    where
        T: FromStr + Copy + std::fmt::Debug,
    {
        let text = self.text(field, "");
        match T::from_str(&text) {
            Ok(value) => value,
            Err(_) => {
                if !text.is_empty() {
                    warn!(
                        device = self.device_id,
                        field,
                        value = text,
                        default = ?fallback,
                        "unknown state value, using default"
                    );
                }
                fallback
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
