// Hand-crafted async HTTP client for the dashboard backend REST API.
//
// Base path: /api/
// No auth: credential capture belongs to the embedding page, not here.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{DeviceDraft, DeviceRecord, DeviceTypeDescriptor, ImportReport};

/// Async client for the device REST API consumed by the dashboards.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a dashboard base URL and transport config.
    pub fn new(base_url: &Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages its setup).
    pub fn from_reqwest(base_url: &Url, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: Self::normalize_base_url(base_url),
        }
    }

    /// Ensure the base URL ends with a slash so relative joins work.
    fn normalize_base_url(raw: &Url) -> Url {
        let mut url = raw.clone();
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// Join a relative path (e.g. `"api/devices"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path);
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview = &body[..body.len().min(200)];
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    /// The backend reports failures as plain-text bodies.
    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        Error::Api {
            status: status.as_u16(),
            message: if raw.trim().is_empty() {
                status.to_string()
            } else {
                raw.trim().to_owned()
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Device-type catalog ──────────────────────────────────────────

    pub async fn list_device_types(&self) -> Result<Vec<DeviceTypeDescriptor>, Error> {
        self.get("api/device-types").await
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn list_devices(&self) -> Result<Vec<DeviceRecord>, Error> {
        self.get("api/devices").await
    }

    pub async fn create_device(&self, draft: &DeviceDraft) -> Result<DeviceRecord, Error> {
        self.post("api/devices", draft).await
    }

    pub async fn replace_device(
        &self,
        device_id: &str,
        draft: &DeviceDraft,
    ) -> Result<DeviceRecord, Error> {
        self.put(&format!("api/devices/{device_id}"), draft).await
    }

    pub async fn delete_device(&self, device_id: &str) -> Result<(), Error> {
        self.delete(&format!("api/devices/{device_id}")).await
    }

    // ── State mutation ───────────────────────────────────────────────

    /// Toggle power server-side. Deliberately carries no payload: the
    /// local view of the current state may be stale, so the backend
    /// decides the flip. Returns the new authoritative state map.
    pub async fn toggle_device(
        &self,
        device_id: &str,
    ) -> Result<serde_json::Map<String, Value>, Error> {
        self.post_empty(&format!("api/devices/{device_id}/toggle"))
            .await
    }

    /// Apply a partial state patch (changed fields only). Returns the
    /// new authoritative state map.
    pub async fn put_state(
        &self,
        device_id: &str,
        patch: &serde_json::Map<String, Value>,
    ) -> Result<serde_json::Map<String, Value>, Error> {
        self.put(&format!("api/devices/{device_id}/state"), patch)
            .await
    }

    // ── Import/export ────────────────────────────────────────────────

    /// Download the backend's export blob verbatim.
    pub async fn export_devices(&self) -> Result<Vec<u8>, Error> {
        let url = self.url("api/devices/export");
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.bytes().await?.to_vec())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    pub async fn import_devices(&self, payload: &Value) -> Result<ImportReport, Error> {
        self.post("api/devices/import", payload).await
    }
}
