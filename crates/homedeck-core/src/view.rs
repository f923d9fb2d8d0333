// ── Filtered, ordered projection of the registry ──
//
// Recomputed fully on every call: device counts are bounded by what a
// human can operate, so there is no incremental index to keep honest.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::DashboardProfile;
use crate::model::{Device, DeviceKind};

/// User-selected type filters plus a free-text search term.
///
/// The "all" sentinel is mutually exclusive with concrete kinds and
/// the selection can never go empty: both invariants hold by
/// construction, because "all" is represented as the empty kind set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    kinds: BTreeSet<DeviceKind>,
    search: String,
}

impl FilterState {
    /// Everything visible, no search term.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Select the "all" sentinel, clearing every concrete kind.
    pub fn select_all(&mut self) {
        self.kinds.clear();
    }

    /// Select a concrete kind; deselects "all" implicitly.
    pub fn select_kind(&mut self, kind: DeviceKind) {
        self.kinds.insert(kind);
    }

    /// Deselect a concrete kind. Dropping the last one re-selects
    /// "all" (the set may never become empty).
    pub fn deselect_kind(&mut self, kind: &DeviceKind) {
        self.kinds.remove(kind);
    }

    pub fn selected_kinds(&self) -> impl Iterator<Item = &DeviceKind> {
        self.kinds.iter()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    fn matches_kind(&self, kind: &DeviceKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(kind)
    }

    /// Case-insensitive substring match over id, name, room,
    /// manufacturer, and model. An empty term matches everything.
    fn matches_search(&self, device: &Device) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let term = self.search.to_lowercase();

        let haystacks = [
            Some(device.id.as_str()),
            Some(device.name.as_str()),
            device.room.as_deref(),
            device.manufacturer.as_deref(),
            device.model.as_deref(),
        ];
        haystacks
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
    }

    /// Type filter first, then search: a device that fails the type
    /// filter is excluded regardless of search match.
    pub fn matches(&self, device: &Device) -> bool {
        self.matches_kind(&device.kind) && self.matches_search(device)
    }
}

/// Compute the visible, ordered device sequence for one render pass.
///
/// Ordering is deterministic for identical inputs. The simulator
/// profile sorts by display name (case-sensitive), the health-monitor
/// profile puts offline devices first; both break ties by id.
pub fn visible(
    devices: &[Arc<Device>],
    filter: &FilterState,
    profile: DashboardProfile,
) -> Vec<Arc<Device>> {
    let mut result: Vec<Arc<Device>> = devices
        .iter()
        .filter(|d| filter.matches(d))
        .cloned()
        .collect();

    match profile {
        DashboardProfile::DeviceSimulator => {
            result.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        }
        DashboardProfile::HealthMonitor => {
            result.sort_by(|a, b| a.online.cmp(&b.online).then_with(|| a.id.cmp(&b.id)));
        }
    }

    result
}

// ── Tests ────────────────────────────────────────────────────────────
