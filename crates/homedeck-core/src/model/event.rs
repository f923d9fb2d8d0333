// ── Registry events ──
//
// Inbound changes after schema decoding, ready to apply to the
// DeviceRegistry. One enum covers both wire profiles: per-entity
// deltas and full-snapshot resyncs.

use super::device::{Device, DeviceId};

/// Aggregate counters carried by snapshot-style frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetStats {
    pub total_devices: u64,
    pub online_devices: u64,
    pub offline_devices: u64,
    pub battery_warnings: u64,
}

/// A decoded inbound change for the device registry.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    Created(Device),
    Updated(Device),
    StateChanged(Device),
    Deleted(DeviceId),
    /// Full resync: replaces the entire registry contents. The only
    /// way short of an explicit delete for a device to disappear.
    Resync {
        devices: Vec<Device>,
        stats: FleetStats,
    },
}
