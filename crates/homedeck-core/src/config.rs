// ── Runtime session configuration ──
//
// These types describe *how* to reach a dashboard backend. They carry
// connection tuning only and never touch disk -- the embedding
// application constructs a `DashboardConfig` and hands it in.

use std::time::Duration;

use homedeck_api::{RetryPolicy, TransportConfig};
use url::Url;

/// Which backend profile feeds this dashboard.
///
/// The profile selects the push-channel reconnect delay and the
/// visible-device sort order; it never restricts which push message
/// styles are accepted (a deployment may mix both on one channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardProfile {
    /// Device simulator: per-entity delta events, name-ordered grid.
    #[default]
    DeviceSimulator,
    /// Health monitor: full-snapshot frames, offline-first grid.
    HealthMonitor,
}

impl DashboardProfile {
    /// Fixed delay between reconnection attempts. No backoff growth
    /// and no retry cap: these are long-lived operator consoles.
    pub fn reconnect_delay(self) -> Duration {
        match self {
            Self::DeviceSimulator => Duration::from_secs(3),
            Self::HealthMonitor => Duration::from_secs(5),
        }
    }

    pub fn retry_policy(self) -> RetryPolicy {
        RetryPolicy::fixed(self.reconnect_delay())
    }
}

/// Configuration for one dashboard session.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend base URL (e.g. `http://localhost:8083`). The push
    /// endpoint is derived from it, upgraded to `wss` when secure.
    pub base_url: Url,
    pub profile: DashboardProfile,
    pub transport: TransportConfig,
}

impl DashboardConfig {
    pub fn new(base_url: Url, profile: DashboardProfile) -> Self {
        Self {
            base_url,
            profile,
            transport: TransportConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_reconnect_delays() {
        assert_eq!(
            DashboardProfile::DeviceSimulator.reconnect_delay(),
            Duration::from_secs(3)
        );
        assert_eq!(
            DashboardProfile::HealthMonitor.reconnect_delay(),
            Duration::from_secs(5)
        );
    }
}
