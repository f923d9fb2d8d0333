// ── Render projection ──
//
// Pure functions from (visible devices, schemas, policy) to display
// nodes. No business logic lives here and nothing is mutated; the
// rendering technology is the consumer's choice.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::controls::{QuickAction, quick_action_for};
use crate::model::{Device, DeviceId};
use crate::schema::SchemaRegistry;

// ── Display nodes ────────────────────────────────────────────────────

/// One formatted state field on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLine {
    pub label: String,
    pub value: String,
}

/// One formatted health metric on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLine {
    pub label: &'static str,
    pub value: String,
    pub warning: bool,
}

/// Everything a renderer needs for one summary card.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCard {
    pub id: DeviceId,
    pub title: String,
    pub icon: String,
    pub kind_label: String,
    pub room: Option<String>,
    pub online: bool,
    pub state_lines: Vec<StateLine>,
    pub metrics: Vec<MetricLine>,
    pub quick_action: Option<QuickAction>,
    pub alert_count: usize,
}

/// Aggregate counters for the summary header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetSummary {
    pub total: usize,
    pub online: usize,
    /// Powered on, motion detected, or contact open.
    pub active: usize,
    pub battery_warnings: usize,
}

// ── Projection ───────────────────────────────────────────────────────

/// Project an ordered device sequence into display cards.
///
/// `now` is passed in (rather than read from the clock) so last-seen
/// ages are deterministic for a render pass.
pub fn project(
    devices: &[Arc<Device>],
    schemas: &SchemaRegistry,
    now: DateTime<Utc>,
) -> Vec<DeviceCard> {
    devices
        .iter()
        .map(|device| card_for(device, schemas, now))
        .collect()
}

fn card_for(device: &Device, schemas: &SchemaRegistry, now: DateTime<Utc>) -> DeviceCard {
    let schema = schemas.get(&device.kind);

    DeviceCard {
        id: device.id.clone(),
        title: device.name.clone(),
        icon: schema
            .as_ref()
            .map_or_else(|| "fa-question".to_owned(), |s| s.icon.clone()),
        kind_label: schema
            .as_ref()
            .map_or_else(|| device.kind.to_string(), |s| s.display_name.clone()),
        room: device.room.clone(),
        online: device.online,
        state_lines: device
            .state
            .fields()
            .iter()
            .map(|(field, value)| StateLine {
                label: field.replace('_', " "),
                value: format_state_value(field, value),
            })
            .collect(),
        metrics: metric_lines(device, now),
        quick_action: quick_action_for(device),
        alert_count: device.alerts.len(),
    }
}

fn metric_lines(device: &Device, now: DateTime<Utc>) -> Vec<MetricLine> {
    let mut lines = Vec::new();
    let metrics = &device.metrics;

    if let Some(battery) = metrics.battery {
        lines.push(MetricLine {
            label: "Battery",
            value: format!("{}%", trim_number(battery)),
            warning: metrics.battery_low(),
        });
    }
    if let Some(link) = metrics.link_quality {
        lines.push(MetricLine {
            label: "Link",
            value: format!("{link}/255"),
            warning: false,
        });
    }
    if let Some(temperature) = metrics.temperature {
        lines.push(MetricLine {
            label: "Temp",
            value: format!("{temperature:.1}\u{b0}C"),
            warning: false,
        });
    }
    if let Some(humidity) = metrics.humidity {
        lines.push(MetricLine {
            label: "Humidity",
            value: format!("{humidity:.1}%"),
            warning: false,
        });
    }
    if let Some(last_seen) = device.last_seen {
        lines.push(MetricLine {
            label: "Last Seen",
            value: format_age(now - last_seen),
            warning: false,
        });
    }

    lines
}

/// Aggregate counters over the full registry snapshot.
pub fn summarize(devices: &[Arc<Device>]) -> FleetSummary {
    FleetSummary {
        total: devices.len(),
        online: devices.iter().filter(|d| d.online).count(),
        active: devices.iter().filter(|d| d.state.is_active()).count(),
        battery_warnings: devices.iter().filter(|d| d.metrics.battery_low()).count(),
    }
}

// ── Value formatting ─────────────────────────────────────────────────

/// Format one state value for display, with field-aware units.
pub fn format_state_value(field: &str, value: &Value) -> String {
    match value {
        Value::Bool(b) => if *b { "Yes" } else { "No" }.to_owned(),
        Value::Number(n) => {
            let rendered = n.as_f64().map_or_else(|| n.to_string(), trim_number);
            if field.contains("temperature") {
                format!("{rendered}\u{b0}C")
            } else if field.contains("humidity")
                || field.contains("brightness")
                || field == "position"
            {
                format!("{rendered}%")
            } else {
                rendered
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render whole numbers without a trailing `.0`.
fn trim_number(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// `"3d ago"`, `"2h ago"`, `"5m ago"`, `"12s ago"`.
pub fn format_age(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d ago")
    } else if hours > 0 {
        format!("{hours}h ago")
    } else if minutes > 0 {
        format!("{minutes}m ago")
    } else {
        format!("{seconds}s ago")
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{
        ContactState, DeviceKind, DeviceMetrics, DeviceState, PowerState,
    };
    use serde_json::json;

    fn device(id: &str, kind: DeviceKind, state: DeviceState, online: bool) -> Arc<Device> {
        Arc::new(Device {
            id: DeviceId::from(id),
            kind,
            name: format!("Device {id}"),
            room: Some("Office".into()),
            manufacturer: None,
            model: None,
            online,
            state,
            metrics: DeviceMetrics::default(),
            first_seen: None,
            last_seen: None,
            update_count: 0,
            alerts: Vec::new(),
        })
    }

    #[test]
    fn state_values_format_with_units() {
        assert_eq!(format_state_value("state", &json!("on")), "on");
        assert_eq!(format_state_value("motion", &json!(true)), "Yes");
        assert_eq!(format_state_value("recording", &json!(false)), "No");
        assert_eq!(format_state_value("brightness", &json!(80.0)), "80%");
        assert_eq!(format_state_value("position", &json!(45)), "45%");
        assert_eq!(
            format_state_value("current_temperature", &json!(21.5)),
            "21.5\u{b0}C"
        );
        assert_eq!(format_state_value("humidity", &json!(50.0)), "50%");
    }

    #[test]
    fn ages_format_in_coarse_units() {
        assert_eq!(format_age(Duration::seconds(12)), "12s ago");
        assert_eq!(format_age(Duration::minutes(5)), "5m ago");
        assert_eq!(format_age(Duration::hours(26)), "1d ago");
        // Clock skew never shows negative ages
        assert_eq!(format_age(Duration::seconds(-30)), "0s ago");
    }

    #[test]
    fn card_pulls_icon_and_label_from_schema() {
        let schemas = SchemaRegistry::builtin();
        let light = device(
            "l1",
            DeviceKind::Light,
            DeviceState::Light {
                power: PowerState::On,
                brightness: 80.0,
                color: None,
            },
            true,
        );

        let cards = project(&[light], &schemas, Utc::now());
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.icon, "fa-lightbulb");
        assert_eq!(card.kind_label, "Light");
        assert_eq!(card.quick_action, Some(QuickAction::TogglePower));
        assert_eq!(
            card.state_lines[1],
            StateLine {
                label: "brightness".into(),
                value: "80%".into()
            }
        );
    }

    #[test]
    fn unknown_kind_gets_fallback_icon() {
        let schemas = SchemaRegistry::builtin();
        let stranger = device(
            "v1",
            DeviceKind::Other("valve".into()),
            DeviceState::Generic(serde_json::Map::new()),
            true,
        );

        let cards = project(&[stranger], &schemas, Utc::now());
        assert_eq!(cards[0].icon, "fa-question");
        assert_eq!(cards[0].kind_label, "valve");
        assert_eq!(cards[0].quick_action, None);
    }

    #[test]
    fn metric_lines_flag_low_battery() {
        let mut inner = (*device(
            "m1",
            DeviceKind::Motion,
            DeviceState::Motion { motion: false },
            true,
        ))
        .clone();
        inner.metrics = DeviceMetrics {
            battery: Some(17.0),
            link_quality: Some(96),
            temperature: None,
            humidity: None,
        };
        let cards = project(&[Arc::new(inner)], &SchemaRegistry::builtin(), Utc::now());

        let battery = &cards[0].metrics[0];
        assert_eq!(battery.value, "17%");
        assert!(battery.warning);
        assert_eq!(cards[0].metrics[1].value, "96/255");
    }

    #[test]
    fn summary_counts_follow_state() {
        let devices = vec![
            device(
                "a",
                DeviceKind::Light,
                DeviceState::Light {
                    power: PowerState::On,
                    brightness: 100.0,
                    color: None,
                },
                true,
            ),
            device(
                "b",
                DeviceKind::Door,
                DeviceState::Door {
                    contact: ContactState::Closed,
                },
                false,
            ),
            device("c", DeviceKind::Motion, DeviceState::Motion { motion: true }, true),
        ];

        let summary = summarize(&devices);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.online, 2);
        assert_eq!(summary.active, 2); // light on + motion detected
        assert_eq!(summary.battery_warnings, 0);
    }
}
