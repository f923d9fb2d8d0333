// Integration tests for `RestClient` using wiremock.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use homedeck_api::types::DeviceDraft;
use homedeck_api::{Error, RestClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let client = RestClient::from_reqwest(&base, reqwest::Client::new());
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_device_types() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "type": "light",
            "name": "Light",
            "icon": "fa-lightbulb",
            "default_state": { "state": "off", "brightness": 100 }
        },
        {
            "type": "lock",
            "name": "Lock",
            "icon": "fa-lock",
            "default_state": { "state": "locked" }
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/api/device-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let types = client.list_device_types().await.unwrap();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0].kind, "light");
    assert_eq!(types[0].icon, "fa-lightbulb");
    assert_eq!(types[1].default_state["state"], "locked");
}

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "id": "light1",
            "type": "light",
            "name": "Desk Lamp",
            "room": "Office",
            "online": true,
            "state": { "state": "off", "brightness": 80 }
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, "light1");
    assert_eq!(devices[0].state["brightness"], 80);
}

#[tokio::test]
async fn test_create_device_posts_draft() {
    let (server, client) = setup().await;

    let draft = DeviceDraft {
        id: None,
        kind: "fan".into(),
        name: "Ceiling Fan".into(),
        room: Some("Bedroom".into()),
        state: serde_json::Map::new(),
    };

    let response = json!({
        "id": "sim_fan_1740000000",
        "type": "fan",
        "name": "Ceiling Fan",
        "room": "Bedroom",
        "online": true,
        "state": { "state": "off", "speed": "medium" }
    });

    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .and(body_json(json!({
            "type": "fan",
            "name": "Ceiling Fan",
            "room": "Bedroom",
            "state": {}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response))
        .mount(&server)
        .await;

    let created = client.create_device(&draft).await.unwrap();
    assert_eq!(created.id, "sim_fan_1740000000");
    assert_eq!(created.state["speed"], "medium");
}

#[tokio::test]
async fn test_toggle_has_no_payload() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/devices/light1/toggle"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "state": "on", "brightness": 80 })),
        )
        .mount(&server)
        .await;

    let state = client.toggle_device("light1").await.unwrap();
    assert_eq!(state["state"], "on");
    assert_eq!(state["brightness"], 80);
}

#[tokio::test]
async fn test_put_state_sends_partial_patch() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/devices/cover1/state"))
        .and(body_json(json!({ "position": 100, "state": "open" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "position": 100, "state": "open" })),
        )
        .mount(&server)
        .await;

    let mut patch = serde_json::Map::new();
    patch.insert("position".into(), json!(100));
    patch.insert("state".into(), json!("open"));

    let state = client.put_state("cover1", &patch).await.unwrap();
    assert_eq!(state["position"], 100);
}

#[tokio::test]
async fn test_delete_device() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/devices/old1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.delete_device("old1").await.unwrap();
}

#[tokio::test]
async fn test_export_returns_raw_bytes() {
    let (server, client) = setup().await;

    let blob = br#"{"version":"1.0","devices":[]}"#;
    Mock::given(method("GET"))
        .and(path("/api/devices/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(blob.as_slice()))
        .mount(&server)
        .await;

    let bytes = client.export_devices().await.unwrap();
    assert_eq!(bytes, blob);
}

#[tokio::test]
async fn test_import_reports_counts() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/devices/import"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "imported": 3, "skipped": 1 })),
        )
        .mount(&server)
        .await;

    let report = client
        .import_devices(&json!({ "devices": [] }))
        .await
        .unwrap();
    assert_eq!(report.imported, 3);
    assert_eq!(report.skipped, 1);
}

// ── Failure tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_not_found_surfaces_status_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/devices/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Device not found\n"))
        .mount(&server)
        .await;

    let err = client.delete_device("ghost").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Device not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.delete_device("ghost").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_malformed_body_is_a_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.list_devices().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}

#[tokio::test]
async fn test_base_url_with_trailing_slash() {
    let server = MockServer::start().await;
    let base = Url::parse(&format!("{}/", server.uri())).unwrap();
    let client = RestClient::from_reqwest(&base, reqwest::Client::new());

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(client.list_devices().await.unwrap().is_empty());
}
