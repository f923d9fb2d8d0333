// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// dashboard session routes each variant to the appropriate backend
// request and folds the authoritative response into the registry.

use std::sync::Arc;

use serde_json::Value;

use homedeck_api::types::{DeviceDraft, ImportReport};

use crate::controls::StatePatch;
use crate::error::CoreError;
use crate::model::{Device, DeviceId, DeviceKind};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Static attributes for creating or replacing a device.
#[derive(Debug, Clone)]
pub struct DeviceSpec {
    /// Optional custom id on create; ignored on replace, where the id
    /// is immutable once the edit began.
    pub id: Option<String>,
    pub kind: DeviceKind,
    pub name: String,
    pub room: Option<String>,
    /// Initial state fields, typed per the kind's template.
    pub state: serde_json::Map<String, Value>,
}

impl DeviceSpec {
    pub(crate) fn into_wire(self) -> DeviceDraft {
        DeviceDraft {
            id: self.id,
            kind: self.kind.to_string(),
            name: self.name,
            room: self.room,
            state: self.state,
        }
    }
}

/// All write operations against the dashboard backend.
#[derive(Debug, Clone)]
pub enum Command {
    // ── State changes ────────────────────────────────────────────────
    /// Flip power server-side. No payload by design: the local view of
    /// the current state may be stale, so the backend decides the flip.
    Toggle {
        id: DeviceId,
    },
    /// Send a partial state patch (changed fields only).
    PatchState {
        id: DeviceId,
        patch: StatePatch,
    },

    // ── Device CRUD ──────────────────────────────────────────────────
    Create {
        spec: DeviceSpec,
    },
    Replace {
        id: DeviceId,
        spec: DeviceSpec,
    },
    /// Rejected unless `confirmed` -- destructive commands require an
    /// explicit operator confirmation step. The registry row is only
    /// removed after the backend acknowledges.
    Delete {
        id: DeviceId,
        confirmed: bool,
    },

    // ── Bulk transfer ────────────────────────────────────────────────
    Export,
    Import {
        payload: Value,
    },
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    /// The device as confirmed by the backend and folded into the
    /// registry -- never the locally optimistic value.
    Device(Arc<Device>),
    Deleted(DeviceId),
    /// Raw export blob, passed through for the download side channel.
    Export(Vec<u8>),
    Import(ImportReport),
}
