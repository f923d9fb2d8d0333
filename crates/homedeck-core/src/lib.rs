// homedeck-core: Device registry and real-time synchronization core
// between homedeck-api and dashboard renderers.

pub mod command;
pub mod config;
pub mod controls;
pub mod convert;
pub mod error;
pub mod model;
pub mod project;
pub mod schema;
pub mod session;
pub mod store;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult, DeviceSpec};
pub use config::{DashboardConfig, DashboardProfile};
pub use controls::{Control, ControlPanel, QuickAction, StatePatch};
pub use error::CoreError;
pub use schema::{FieldKind, SchemaRegistry, TypeSchema};
pub use session::{Dashboard, Notice, NoticeSeverity};
pub use store::{DeviceRegistry, DeviceStream};
pub use view::FilterState;

// Re-export connection state from the wire layer -- the session
// mirrors it, consumers should not need homedeck-api directly.
pub use homedeck_api::push::ConnectionState;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Alert, AlertSeverity, ContactState, CoverState, Device, DeviceId, DeviceKind, DeviceMetrics,
    DeviceState, FanSpeed, FleetStats, LockState, PowerState, RegistryEvent, ThermostatMode,
};
