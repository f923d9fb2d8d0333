// ── Dashboard session ──
//
// Explicit context object for one dashboard instance: owns the schema
// registry, the device registry, the push channel, and the command
// processor. Multiple sessions can coexist and tear down
// deterministically, which is what the tests rely on.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use homedeck_api::push::{ConnectionState, PushChannel, push_endpoint};
use homedeck_api::types::PushMessage;
use homedeck_api::RestClient;

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::DashboardConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{Device, DeviceId};
use crate::schema::SchemaRegistry;
use crate::store::{DeviceRegistry, DeviceStream};
use crate::view::{self, FilterState};

const COMMAND_CHANNEL_SIZE: usize = 64;
const NOTICE_CHANNEL_SIZE: usize = 64;

// ── Notices ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Success,
    Error,
}

/// Transient, user-visible notification (the toast contract). The UI
/// collaborator renders and auto-dismisses these; the core only emits.
#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub message: String,
}

// ── Dashboard ────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Manages the session lifecycle: initial
/// catalog + device load, push channel supervision, command routing,
/// and reactive snapshots.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    rest: RestClient,
    schemas: SchemaRegistry,
    registry: DeviceRegistry,
    notice_tx: broadcast::Sender<Notice>,
    connection: watch::Sender<ConnectionState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    push: Mutex<Option<PushChannel>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    /// Create a session from configuration. Does NOT connect -- call
    /// [`connect()`](Self::connect) to load data and start background
    /// tasks.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let rest = RestClient::new(&config.base_url, &config.transport)?;
        let (notice_tx, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let (connection, _) = watch::channel(ConnectionState::Closed);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(DashboardInner {
                config,
                rest,
                schemas: SchemaRegistry::builtin(),
                registry: DeviceRegistry::new(),
                notice_tx,
                connection,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                push: Mutex::new(None),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.inner.schemas
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.inner.registry
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Connect: load the type catalog and device list, open the push
    /// channel, and spawn the background tasks (push applier,
    /// connectivity notifier, command processor).
    pub async fn connect(&self) -> Result<(), CoreError> {
        let inner = &self.inner;
        let _ = inner.connection.send(ConnectionState::Connecting);

        // Catalog first: decoding devices needs the schemas. A failure
        // here is non-fatal, the built-in copy covers the known kinds.
        match inner.rest.list_device_types().await {
            Ok(descriptors) => {
                debug!(count = descriptors.len(), "loaded device-type catalog");
                inner.schemas.load(descriptors);
            }
            Err(e) => {
                warn!(error = %e, "catalog fetch failed, using built-in schemas");
            }
        }

        // Initial device load is fatal on failure: without it the
        // registry would silently start empty.
        let records = inner.rest.list_devices().await?;
        let devices: Vec<Device> = records
            .iter()
            .map(|r| convert::device_from_record(r, &inner.schemas))
            .collect();
        debug!(count = devices.len(), "initial device load");
        inner.registry.replace_all(devices);

        // Push channel, supervised by this session's cancel token.
        let endpoint = push_endpoint(&inner.config.base_url)?;
        let channel = PushChannel::open(
            endpoint,
            inner.config.profile.retry_policy(),
            inner.cancel.child_token(),
        );

        let mut handles = inner.task_handles.lock().await;
        handles.push(tokio::spawn(push_applier_task(
            self.clone(),
            channel.subscribe(),
        )));
        handles.push(tokio::spawn(connectivity_task(
            self.clone(),
            channel.connection_state(),
        )));
        if let Some(rx) = inner.command_rx.lock().await.take() {
            handles.push(tokio::spawn(command_processor_task(self.clone(), rx)));
        }
        drop(handles);

        *inner.push.lock().await = Some(channel);

        info!("dashboard session connected");
        Ok(())
    }

    /// Cancel background tasks and join them. The session cannot be
    /// reconnected afterwards; build a fresh one instead.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        inner.cancel.cancel();

        if let Some(channel) = inner.push.lock().await.take() {
            channel.shutdown();
        }

        let mut handles = inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        let _ = inner.connection.send(ConnectionState::Closed);
        debug!("dashboard session shut down");
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a command and await the backend-confirmed result.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::SessionClosed)?;

        rx.await.map_err(|_| CoreError::SessionClosed)?
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to registry snapshot changes.
    pub fn devices(&self) -> DeviceStream {
        self.inner.registry.subscribe()
    }

    /// Current id-ordered snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.registry.snapshot()
    }

    /// Filtered, profile-ordered projection of the current snapshot.
    pub fn visible(&self, filter: &FilterState) -> Vec<Arc<Device>> {
        view::visible(&self.snapshot(), filter, self.inner.config.profile)
    }

    /// Subscribe to user-visible notices.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notice_tx.subscribe()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe()
    }

    fn notify(&self, severity: NoticeSeverity, message: impl Into<String>) {
        // Send errors just mean nobody is watching the toasts
        let _ = self.inner.notice_tx.send(Notice {
            severity,
            message: message.into(),
        });
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Apply decoded push messages to the registry, in delivery order.
async fn push_applier_task(
    dashboard: Dashboard,
    mut rx: broadcast::Receiver<Arc<PushMessage>>,
) {
    let cancel = dashboard.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = rx.recv() => {
                match message {
                    Ok(message) => {
                        let event = convert::event_from_push(message.as_ref(), &dashboard.inner.schemas);
                        dashboard.inner.registry.apply(event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Dropped deltas heal on the next full event for
                        // each device; nothing to replay.
                        warn!(skipped, "push applier lagged behind the channel");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Mirror the push channel's connection state onto the session and
/// emit connectivity notices on transitions.
async fn connectivity_task(
    dashboard: Dashboard,
    mut state_rx: watch::Receiver<ConnectionState>,
) {
    let cancel = dashboard.inner.cancel.clone();
    let mut was_open = false;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow_and_update();
                let _ = dashboard.inner.connection.send(state);

                match state {
                    ConnectionState::Open => {
                        dashboard.notify(NoticeSeverity::Success, "Connected to device dashboard");
                        was_open = true;
                    }
                    ConnectionState::Connecting if was_open => {
                        dashboard.notify(NoticeSeverity::Error, "Connection lost -- reconnecting");
                        was_open = false;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Process commands from the mpsc channel, routing each to the
/// appropriate backend request.
async fn command_processor_task(
    dashboard: Dashboard,
    mut rx: mpsc::Receiver<CommandEnvelope>,
) {
    let cancel = dashboard.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&dashboard, envelope.command).await;
                if let Err(ref e) = result {
                    // Command failures surface as a dismissible notice;
                    // the registry keeps its last confirmed contents.
                    dashboard.notify(NoticeSeverity::Error, e.to_string());
                }
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────────

/// Route a command to the backend and fold the authoritative response
/// into the registry. No optimistic mutation: on any failure the
/// registry keeps whatever it last confirmed.
async fn route_command(
    dashboard: &Dashboard,
    command: Command,
) -> Result<CommandResult, CoreError> {
    let inner = &dashboard.inner;

    match command {
        Command::Toggle { id } => {
            let current = known_device(dashboard, &id)?;
            let new_state = inner.rest.toggle_device(id.as_str()).await?;
            Ok(CommandResult::Device(fold_state(
                dashboard, &current, &new_state,
            )))
        }

        Command::PatchState { id, patch } => {
            let current = known_device(dashboard, &id)?;
            let new_state = inner.rest.put_state(id.as_str(), patch.as_map()).await?;
            Ok(CommandResult::Device(fold_state(
                dashboard, &current, &new_state,
            )))
        }

        Command::Create { spec } => {
            let record = inner.rest.create_device(&spec.into_wire()).await?;
            let device = convert::device_from_record(&record, &inner.schemas);
            inner.registry.upsert(device.clone());
            Ok(CommandResult::Device(Arc::new(device)))
        }

        Command::Replace { id, spec } => {
            // The id became immutable when the edit began
            let mut draft = spec.into_wire();
            draft.id = Some(id.to_string());
            let record = inner.rest.replace_device(id.as_str(), &draft).await?;
            let device = convert::device_from_record(&record, &inner.schemas);
            inner.registry.upsert(device.clone());
            Ok(CommandResult::Device(Arc::new(device)))
        }

        Command::Delete { id, confirmed } => {
            if !confirmed {
                return Err(CoreError::ConfirmationRequired { id: id.to_string() });
            }
            inner.rest.delete_device(id.as_str()).await?;
            // Removed only now that the backend confirmed
            inner.registry.remove(&id);
            Ok(CommandResult::Deleted(id))
        }

        Command::Export => Ok(CommandResult::Export(inner.rest.export_devices().await?)),

        Command::Import { payload } => {
            let report = inner.rest.import_devices(&payload).await?;
            // Importing happens server-side; resync to pick up the rows
            let records = inner.rest.list_devices().await?;
            let devices: Vec<Device> = records
                .iter()
                .map(|r| convert::device_from_record(r, &inner.schemas))
                .collect();
            inner.registry.replace_all(devices);
            Ok(CommandResult::Import(report))
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn known_device(dashboard: &Dashboard, id: &DeviceId) -> Result<Arc<Device>, CoreError> {
    dashboard
        .inner
        .registry
        .get(id)
        .ok_or_else(|| CoreError::DeviceNotFound { id: id.to_string() })
}

/// Replace a device's state with the backend-returned map and store
/// the result. The echoed state -- not the locally optimistic value --
/// is what persists.
fn fold_state(
    dashboard: &Dashboard,
    current: &Arc<Device>,
    new_state: &serde_json::Map<String, serde_json::Value>,
) -> Arc<Device> {
    let schema = dashboard.inner.schemas.get(&current.kind);
    let state = convert::state_from_wire(
        &current.kind,
        new_state,
        schema.as_deref(),
        current.id.as_str(),
    );

    let mut updated = (**current).clone();
    updated.state = state;
    let updated = Arc::new(updated);
    dashboard.inner.registry.upsert((*updated).clone());
    updated
}
