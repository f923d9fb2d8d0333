// ── Typed device state ──
//
// The wire ships state as an untyped field map. In the core it is a
// closed union keyed by device kind: every variant carries its own
// strongly typed fields, built by the schema-driven decoder in
// `convert`. Unknown kinds keep their raw map in `Generic`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// On/off power state shared by lights, switches, and fans.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LockState {
    Locked,
    Unlocked,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CoverState {
    Open,
    Closed,
    Stopped,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContactState {
    Open,
    Closed,
}

/// Thermostat operating mode. Single-select: choosing one deselects
/// the rest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThermostatMode {
    Off,
    Heat,
    Cool,
    Auto,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FanSpeed {
    Low,
    Medium,
    High,
}

/// Closed union of per-kind state shapes.
///
/// Numeric fields are `f64` throughout: the wire carries plain JSON
/// numbers and sliders may produce fractional values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeviceState {
    Light {
        #[serde(rename = "state")]
        power: PowerState,
        brightness: f64,
        /// Present only for color-capable lights; its presence is what
        /// makes the color picker appear.
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    Switch {
        #[serde(rename = "state")]
        power: PowerState,
    },
    Sensor {
        temperature: f64,
        humidity: f64,
    },
    Thermostat {
        mode: ThermostatMode,
        current_temperature: f64,
        target_temperature: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        fan_mode: Option<String>,
    },
    Lock {
        state: LockState,
    },
    Cover {
        state: CoverState,
        position: f64,
    },
    Motion {
        motion: bool,
    },
    Door {
        contact: ContactState,
    },
    Camera {
        #[serde(rename = "state")]
        activity: String,
        recording: bool,
    },
    Fan {
        #[serde(rename = "state")]
        power: PowerState,
        speed: FanSpeed,
    },
    /// Raw field map for kinds outside the catalog. Read-only.
    Generic(serde_json::Map<String, Value>),
}

impl DeviceState {
    /// Power state for kinds that have one.
    pub fn power(&self) -> Option<PowerState> {
        match self {
            Self::Light { power, .. } | Self::Switch { power } | Self::Fan { power, .. } => {
                Some(*power)
            }
            _ => None,
        }
    }

    /// Whether the device counts as "active" on the summary cards:
    /// powered on, motion detected, or contact open.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Light { power, .. } | Self::Switch { power } | Self::Fan { power, .. } => {
                power.is_on()
            }
            Self::Motion { motion } => *motion,
            Self::Door { contact } => matches!(contact, ContactState::Open),
            _ => false,
        }
    }

    /// State fields in wire naming and canonical order, for read-only
    /// display of any kind.
    pub fn fields(&self) -> Vec<(String, Value)> {
        fn json_num(n: f64) -> Value {
            serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
        }

        match self {
            Self::Light {
                power,
                brightness,
                color,
            } => {
                let mut fields = vec![
                    ("state".to_owned(), Value::String(power.to_string())),
                    ("brightness".to_owned(), json_num(*brightness)),
                ];
                if let Some(color) = color {
                    fields.push(("color".to_owned(), Value::String(color.clone())));
                }
                fields
            }
            Self::Switch { power } => {
                vec![("state".to_owned(), Value::String(power.to_string()))]
            }
            Self::Sensor {
                temperature,
                humidity,
            } => vec![
                ("temperature".to_owned(), json_num(*temperature)),
                ("humidity".to_owned(), json_num(*humidity)),
            ],
            Self::Thermostat {
                mode,
                current_temperature,
                target_temperature,
                fan_mode,
            } => {
                let mut fields = vec![
                    ("mode".to_owned(), Value::String(mode.to_string())),
                    ("current_temperature".to_owned(), json_num(*current_temperature)),
                    ("target_temperature".to_owned(), json_num(*target_temperature)),
                ];
                if let Some(fan_mode) = fan_mode {
                    fields.push(("fan_mode".to_owned(), Value::String(fan_mode.clone())));
                }
                fields
            }
            Self::Lock { state } => {
                vec![("state".to_owned(), Value::String(state.to_string()))]
            }
            Self::Cover { state, position } => vec![
                ("state".to_owned(), Value::String(state.to_string())),
                ("position".to_owned(), json_num(*position)),
            ],
            Self::Motion { motion } => vec![("motion".to_owned(), Value::Bool(*motion))],
            Self::Door { contact } => {
                vec![("contact".to_owned(), Value::String(contact.to_string()))]
            }
            Self::Camera {
                activity,
                recording,
            } => vec![
                ("state".to_owned(), Value::String(activity.clone())),
                ("recording".to_owned(), Value::Bool(*recording)),
            ],
            Self::Fan { power, speed } => vec![
                ("state".to_owned(), Value::String(power.to_string())),
                ("speed".to_owned(), Value::String(speed.to_string())),
            ],
            Self::Generic(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }
}
