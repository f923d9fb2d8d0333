// ── Device-type schema registry ──
//
// Static catalog of device types: display metadata plus a default-state
// template whose value types fix the expected type of every state field
// for that kind. Loaded once per session (from the backend catalog or
// the built-in copy) and read lock-free everywhere else.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde_json::{Value, json};

use homedeck_api::types::DeviceTypeDescriptor;

use crate::model::DeviceKind;

/// Expected JSON type of one state field, derived from its template
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Number,
    Text,
}

impl FieldKind {
    /// Classify a JSON value. Anything outside the three scalar kinds
    /// has no place in a state template.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::Bool),
            Value::Number(_) => Some(Self::Number),
            Value::String(_) => Some(Self::Text),
            _ => None,
        }
    }
}

/// Schema for one device kind.
#[derive(Debug, Clone)]
pub struct TypeSchema {
    pub kind: DeviceKind,
    pub display_name: String,
    pub icon: String,
    /// Field name → default value, in declaration order.
    pub default_state: IndexMap<String, Value>,
}

impl TypeSchema {
    /// Expected type of a state field, or `None` if the field is not
    /// part of this kind's template.
    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.default_state.get(field).and_then(FieldKind::of)
    }

    pub fn default_for(&self, field: &str) -> Option<&Value> {
        self.default_state.get(field)
    }
}

impl From<DeviceTypeDescriptor> for TypeSchema {
    fn from(descriptor: DeviceTypeDescriptor) -> Self {
        Self {
            kind: DeviceKind::from_wire(descriptor.kind.as_str()),
            display_name: descriptor.name,
            icon: descriptor.icon,
            default_state: descriptor.default_state,
        }
    }
}

/// Lock-free registry of type schemas.
///
/// Read on every inbound event; replaced wholesale at most once per
/// session when the backend catalog arrives.
pub struct SchemaRegistry {
    schemas: ArcSwap<Vec<Arc<TypeSchema>>>,
}

impl SchemaRegistry {
    /// Empty registry: every kind decodes with hard defaults until a
    /// catalog is loaded.
    pub fn empty() -> Self {
        Self {
            schemas: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Registry seeded with the built-in catalog (a copy of the
    /// backend's own).
    pub fn builtin() -> Self {
        let registry = Self::empty();
        registry.replace(builtin_schemas());
        registry
    }

    /// Replace the catalog with descriptors fetched from the backend.
    pub fn load(&self, descriptors: Vec<DeviceTypeDescriptor>) {
        self.replace(descriptors.into_iter().map(TypeSchema::from).collect());
    }

    fn replace(&self, schemas: Vec<TypeSchema>) {
        self.schemas
            .store(Arc::new(schemas.into_iter().map(Arc::new).collect()));
    }

    pub fn get(&self, kind: &DeviceKind) -> Option<Arc<TypeSchema>> {
        self.schemas
            .load()
            .iter()
            .find(|s| s.kind == *kind)
            .cloned()
    }

    /// All schemas in catalog order.
    pub fn all(&self) -> Arc<Vec<Arc<TypeSchema>>> {
        self.schemas.load_full()
    }

    pub fn len(&self) -> usize {
        self.schemas.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.load().is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── Built-in catalog ─────────────────────────────────────────────────

fn schema(kind: DeviceKind, name: &str, icon: &str, defaults: &[(&str, Value)]) -> TypeSchema {
    TypeSchema {
        kind,
        display_name: name.to_owned(),
        icon: icon.to_owned(),
        default_state: defaults
            .iter()
            .map(|(field, value)| ((*field).to_owned(), value.clone()))
            .collect(),
    }
}

/// Mirror of the backend's type catalog, kept for sessions that start
/// before (or without) a successful `GET /api/device-types`.
fn builtin_schemas() -> Vec<TypeSchema> {
    vec![
        schema(
            DeviceKind::Light,
            "Light",
            "fa-lightbulb",
            &[("state", json!("off")), ("brightness", json!(100))],
        ),
        schema(DeviceKind::Switch, "Switch", "fa-toggle-on", &[("state", json!("off"))]),
        schema(
            DeviceKind::Sensor,
            "Sensor",
            "fa-thermometer-half",
            &[("temperature", json!(20.0)), ("humidity", json!(50.0))],
        ),
        schema(
            DeviceKind::Thermostat,
            "Thermostat",
            "fa-temperature-high",
            &[
                ("mode", json!("heat")),
                ("current_temperature", json!(20.0)),
                ("target_temperature", json!(22.0)),
                ("fan_mode", json!("auto")),
            ],
        ),
        schema(DeviceKind::Lock, "Lock", "fa-lock", &[("state", json!("locked"))]),
        schema(
            DeviceKind::Cover,
            "Cover/Blind",
            "fa-window-maximize",
            &[("state", json!("closed")), ("position", json!(0))],
        ),
        schema(
            DeviceKind::Motion,
            "Motion Sensor",
            "fa-walking",
            &[("motion", json!(false))],
        ),
        schema(
            DeviceKind::Door,
            "Door Sensor",
            "fa-door-open",
            &[("contact", json!("closed"))],
        ),
        schema(
            DeviceKind::Camera,
            "Camera",
            "fa-video",
            &[("state", json!("idle")), ("recording", json!(false))],
        ),
        schema(
            DeviceKind::Fan,
            "Fan",
            "fa-fan",
            &[("state", json!("off")), ("speed", json!("medium"))],
        ),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────
