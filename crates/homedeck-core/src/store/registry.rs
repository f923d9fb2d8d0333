// ── Authoritative client-side device map ──
//
// The single piece of mutable shared state in a dashboard session.
// Lock-free storage with push-based change notification via `watch`
// channels; every mutation rebuilds the snapshot subscribers receive.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use super::stream::DeviceStream;
use crate::model::{Device, DeviceId, RegistryEvent};

/// The authoritative map of device id → device record.
///
/// All reads are wait-free; writes use `DashMap`'s per-shard locks.
/// Records are replaced whole on every event (the backend is the
/// source of truth, the client never merges partial state), so the
/// semantics are last-writer-wins with no version reconciliation.
pub struct DeviceRegistry {
    devices: DashMap<DeviceId, Arc<Device>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation. Kept id-ordered so renders
    /// and tests see a deterministic base sequence.
    snapshot: watch::Sender<Arc<Vec<Arc<Device>>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            devices: DashMap::new(),
            version,
            snapshot,
        }
    }

    // ── Event application ────────────────────────────────────────────

    /// Apply one inbound event.
    ///
    /// Upserts are idempotent full-record replacements. Deleting an
    /// unknown id is a no-op, not an error. A resync replaces the
    /// entire contents -- the only path besides an explicit delete by
    /// which a device disappears.
    pub fn apply(&self, event: RegistryEvent) {
        match event {
            RegistryEvent::Created(device)
            | RegistryEvent::Updated(device)
            | RegistryEvent::StateChanged(device) => {
                self.upsert(device);
            }
            RegistryEvent::Deleted(id) => {
                self.remove(&id);
            }
            RegistryEvent::Resync { devices, stats } => {
                debug!(
                    total = stats.total_devices,
                    online = stats.online_devices,
                    "applying full resync"
                );
                self.replace_all(devices);
            }
        }
    }

    /// Insert or replace one device record. Returns `true` if the id
    /// was new.
    pub fn upsert(&self, device: Device) -> bool {
        let is_new = self
            .devices
            .insert(device.id.clone(), Arc::new(device))
            .is_none();

        self.rebuild_snapshot();
        self.bump_version();
        is_new
    }

    /// Remove a device by id. Returns the removed record if it existed.
    pub fn remove(&self, id: &DeviceId) -> Option<Arc<Device>> {
        let removed = self.devices.remove(id).map(|(_, device)| device);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Replace the entire contents with the given set.
    pub fn replace_all(&self, devices: Vec<Device>) {
        self.devices.clear();
        for device in devices {
            self.devices.insert(device.id.clone(), Arc::new(device));
        }
        self.rebuild_snapshot();
        self.bump_version();
    }

    // ── Read surface ─────────────────────────────────────────────────

    pub fn get(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.devices.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot (cheap `Arc` clone), id-ordered.
    ///
    /// Callers must treat it as immutable for the duration of one
    /// render pass; a new event may supersede it immediately after.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.snapshot.borrow().clone()
    }

    /// Subset of the snapshot restricted to the given ids. Unknown ids
    /// are skipped.
    pub fn snapshot_of(&self, ids: &[DeviceId]) -> Vec<Arc<Device>> {
        self.snapshot()
            .iter()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> DeviceStream {
        DeviceStream::new(self.snapshot.subscribe())
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<Device>> =
            self.devices.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| a.id.cmp(&b.id));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{DeviceKind, DeviceMetrics, DeviceState, FleetStats, PowerState};

    fn device(id: &str, name: &str, brightness: f64) -> Device {
        Device {
            id: DeviceId::from(id),
            kind: DeviceKind::Light,
            name: name.to_owned(),
            room: None,
            manufacturer: None,
            model: None,
            online: true,
            state: DeviceState::Light {
                power: PowerState::Off,
                brightness,
                color: None,
            },
            metrics: DeviceMetrics::default(),
            first_seen: None,
            last_seen: None,
            update_count: 0,
            alerts: Vec::new(),
        }
    }

    #[test]
    fn event_sequence_yields_latest_surviving_records() {
        let registry = DeviceRegistry::new();

        registry.apply(RegistryEvent::Created(device("a", "A", 10.0)));
        registry.apply(RegistryEvent::Created(device("b", "B", 20.0)));
        registry.apply(RegistryEvent::Updated(device("a", "A2", 15.0)));
        registry.apply(RegistryEvent::Deleted(DeviceId::from("b")));
        registry.apply(RegistryEvent::StateChanged(device("c", "C", 30.0)));

        let snap = registry.snapshot();
        let ids: Vec<&str> = snap.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);

        // Each id holds the payload of its most recent upsert
        assert_eq!(registry.get(&DeviceId::from("a")).unwrap().name, "A2");
    }

    #[test]
    fn upsert_replaces_whole_record() {
        let registry = DeviceRegistry::new();
        let mut first = device("a", "A", 10.0);
        first.room = Some("Office".into());
        registry.upsert(first);

        // Second record has no room: nothing is merged from the first
        registry.upsert(device("a", "A", 10.0));
        assert_eq!(registry.get(&DeviceId::from("a")).unwrap().room, None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn delete_unknown_id_is_a_noop() {
        let registry = DeviceRegistry::new();
        registry.apply(RegistryEvent::Created(device("a", "A", 10.0)));
        let version = registry.version();

        registry.apply(RegistryEvent::Deleted(DeviceId::from("ghost")));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.version(), version);
    }

    #[test]
    fn resync_replaces_everything() {
        let registry = DeviceRegistry::new();
        registry.apply(RegistryEvent::Created(device("a", "A", 10.0)));
        registry.apply(RegistryEvent::Created(device("b", "B", 20.0)));

        registry.apply(RegistryEvent::Resync {
            devices: vec![device("c", "C", 30.0)],
            stats: FleetStats::default(),
        });

        let snap = registry.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id.as_str(), "c");
    }

    #[test]
    fn snapshot_is_id_ordered() {
        let registry = DeviceRegistry::new();
        for id in ["delta", "alpha", "charlie", "bravo"] {
            registry.upsert(device(id, id, 0.0));
        }

        let snapshot = registry.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["alpha", "bravo", "charlie", "delta"]);
    }

    #[test]
    fn snapshot_of_filters_by_id() {
        let registry = DeviceRegistry::new();
        registry.upsert(device("a", "A", 0.0));
        registry.upsert(device("b", "B", 0.0));

        let subset = registry.snapshot_of(&[DeviceId::from("b"), DeviceId::from("ghost")]);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].id.as_str(), "b");
    }

    #[tokio::test]
    async fn subscription_sees_new_snapshot() {
        let registry = DeviceRegistry::new();
        let mut stream = registry.subscribe();
        assert!(stream.current().is_empty());

        registry.upsert(device("a", "A", 0.0));

        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.len(), 1);
    }
}
