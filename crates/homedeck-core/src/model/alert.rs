// ── Device alerts ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity as reported by the backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Error,
}

/// One active alert on a device.
///
/// Append-only from the backend's perspective: the client never edits
/// an alert, each device update replaces the list wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Alert type label, e.g. `"battery_low"` or `"offline"`.
    pub kind: String,
    pub severity: AlertSeverity,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}
