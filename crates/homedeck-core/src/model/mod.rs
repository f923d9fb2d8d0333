// ── Domain model ──

mod alert;
mod device;
mod event;
mod state;

pub use alert::{Alert, AlertSeverity};
pub use device::{Device, DeviceId, DeviceKind, DeviceMetrics};
pub use event::{FleetStats, RegistryEvent};
pub use state::{
    ContactState, CoverState, DeviceState, FanSpeed, LockState, PowerState, ThermostatMode,
};
