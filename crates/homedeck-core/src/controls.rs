// ── Control policy resolver ──
//
// Declarative description of which controls apply to a device, keyed
// by its kind and current typed state. Every interactive control, on
// change, produces a partial state patch (changed fields only) for the
// command dispatcher; it never mutates anything itself.

use serde_json::{Value, json};

use crate::model::{Device, DeviceState, LockState};

// ── StatePatch ───────────────────────────────────────────────────────

/// A partial state update: only the changed fields, never the whole
/// state object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch(serde_json::Map<String, Value>);

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: Value) -> Self {
        self.0.insert(field.to_owned(), value);
        self
    }

    pub fn as_map(&self) -> &serde_json::Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> serde_json::Map<String, Value> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Quick actions ────────────────────────────────────────────────────

/// The single most common control surfaced on a summary card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    /// Flip power via the dedicated server-side toggle request.
    TogglePower,
    Lock,
    Unlock,
    OpenCover,
    CloseCover,
}

impl QuickAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::TogglePower => "Toggle",
            Self::Lock => "Lock",
            Self::Unlock => "Unlock",
            Self::OpenCover => "Open",
            Self::CloseCover => "Close",
        }
    }

    /// The patch this action dispatches, or `None` for
    /// [`TogglePower`](Self::TogglePower): toggling goes through the
    /// payload-free toggle request because the local view of the
    /// current state may be stale.
    pub fn patch(self) -> Option<StatePatch> {
        match self {
            Self::TogglePower => None,
            Self::Lock => Some(StatePatch::new().with("state", json!("locked"))),
            Self::Unlock => Some(StatePatch::new().with("state", json!("unlocked"))),
            Self::OpenCover => Some(
                StatePatch::new()
                    .with("position", json!(100.0))
                    .with("state", json!("open")),
            ),
            Self::CloseCover => Some(
                StatePatch::new()
                    .with("position", json!(0.0))
                    .with("state", json!("closed")),
            ),
        }
    }
}

/// Quick action for a summary card, keyed purely by device kind (and,
/// for locks and covers, labeled by the current state).
pub fn quick_action_for(device: &Device) -> Option<QuickAction> {
    match &device.state {
        DeviceState::Light { .. } | DeviceState::Switch { .. } | DeviceState::Fan { .. } => {
            Some(QuickAction::TogglePower)
        }
        DeviceState::Lock { state } => Some(match state {
            LockState::Locked => QuickAction::Unlock,
            LockState::Unlocked => QuickAction::Lock,
        }),
        DeviceState::Cover { position, .. } => Some(if *position > 0.0 {
            QuickAction::CloseCover
        } else {
            QuickAction::OpenCover
        }),
        _ => None,
    }
}

// ── Sliders ──────────────────────────────────────────────────────────

/// Slider widgets. Each knows its bounds and how a new value becomes a
/// patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderControl {
    Brightness,
    TargetTemperature,
    CoverPosition,
}

impl SliderControl {
    /// `(min, max, step)`
    pub fn bounds(self) -> (f64, f64, f64) {
        match self {
            Self::Brightness | Self::CoverPosition => (0.0, 100.0, 1.0),
            Self::TargetTemperature => (16.0, 30.0, 0.5),
        }
    }

    /// Patch produced when the slider lands on `value`. Brightness
    /// above zero implies power on; a cover position implies its
    /// open/closed state.
    pub fn patch(self, value: f64) -> StatePatch {
        match self {
            Self::Brightness => {
                let patch = StatePatch::new().with("brightness", json!(value));
                if value > 0.0 {
                    patch.with("state", json!("on"))
                } else {
                    patch
                }
            }
            Self::TargetTemperature => StatePatch::new().with("target_temperature", json!(value)),
            Self::CoverPosition => StatePatch::new().with("position", json!(value)).with(
                "state",
                json!(if value > 0.0 { "open" } else { "closed" }),
            ),
        }
    }

    /// Label shown next to the slider, updated locally and immediately
    /// on drag -- independent of the round-trip to the backend.
    pub fn display_label(self, value: f64) -> String {
        match self {
            Self::Brightness | Self::CoverPosition => format!("{value}%"),
            Self::TargetTemperature => format!("{value}\u{b0}C"),
        }
    }
}

// ── Mode groups ──────────────────────────────────────────────────────

/// Mutually-exclusive option groups: selecting one deselects the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeControl {
    ThermostatMode,
    FanSpeed,
}

impl ModeControl {
    pub fn options(self) -> &'static [&'static str] {
        match self {
            Self::ThermostatMode => &["off", "heat", "cool", "auto"],
            Self::FanSpeed => &["low", "medium", "high"],
        }
    }

    pub fn patch(self, option: &str) -> StatePatch {
        let field = match self {
            Self::ThermostatMode => "mode",
            Self::FanSpeed => "speed",
        };
        StatePatch::new().with(field, json!(option))
    }
}

// ── Color picker ─────────────────────────────────────────────────────

/// Discrete palette offered by the color picker.
pub const COLOR_PALETTE: [&str; 8] = [
    "#ffffff", "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#ff00ff", "#00ffff", "#ff8800",
];

pub fn color_patch(color: &str) -> StatePatch {
    StatePatch::new().with("color", json!(color))
}

// ── Control panel ────────────────────────────────────────────────────

/// One widget in a detail view.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    PowerToggle {
        on: bool,
    },
    Slider {
        control: SliderControl,
        value: f64,
    },
    Modes {
        control: ModeControl,
        selected: String,
    },
    ColorPicker {
        selected: String,
    },
    /// Stateless action button with a fixed patch.
    Button {
        label: &'static str,
        patch: StatePatch,
    },
    /// Read-only state display; values change autonomously.
    ReadOnly {
        fields: Vec<(String, Value)>,
    },
}

/// Everything a detail view needs for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPanel {
    pub quick: Option<QuickAction>,
    pub controls: Vec<Control>,
}

/// Resolve the full control set for a device.
pub fn controls_for(device: &Device) -> ControlPanel {
    let controls = match &device.state {
        DeviceState::Light {
            power,
            brightness,
            color,
        } => {
            let mut controls = vec![
                Control::PowerToggle { on: power.is_on() },
                Control::Slider {
                    control: SliderControl::Brightness,
                    value: *brightness,
                },
            ];
            // Color picker only for lights whose state carries a color
            if let Some(color) = color {
                controls.push(Control::ColorPicker {
                    selected: color.clone(),
                });
            }
            controls
        }
        DeviceState::Thermostat {
            mode,
            target_temperature,
            ..
        } => vec![
            Control::Slider {
                control: SliderControl::TargetTemperature,
                value: *target_temperature,
            },
            Control::Modes {
                control: ModeControl::ThermostatMode,
                selected: mode.to_string(),
            },
        ],
        DeviceState::Cover { position, .. } => vec![
            Control::Slider {
                control: SliderControl::CoverPosition,
                value: *position,
            },
            Control::Button {
                label: "Open",
                patch: StatePatch::new()
                    .with("state", json!("open"))
                    .with("position", json!(100.0)),
            },
            Control::Button {
                label: "Stop",
                // Position stays wherever the cover happens to be
                patch: StatePatch::new().with("state", json!("stopped")),
            },
            Control::Button {
                label: "Close",
                patch: StatePatch::new()
                    .with("state", json!("closed"))
                    .with("position", json!(0.0)),
            },
        ],
        DeviceState::Fan { power, speed } => vec![
            Control::PowerToggle { on: power.is_on() },
            Control::Modes {
                control: ModeControl::FanSpeed,
                selected: speed.to_string(),
            },
        ],
        // Sensors and every other kind: read-only state display
        state => vec![Control::ReadOnly {
            fields: state.fields(),
        }],
    };

    ControlPanel {
        quick: quick_action_for(device),
        controls,
    }
}

// ── Tests ────────────────────────────────────────────────────────────
