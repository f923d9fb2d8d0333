// End-to-end dashboard session tests against a wiremock backend.
//
// The push endpoint has no mock server behind it; the channel just
// keeps retrying in the background, which is exactly what it would do
// against a flaky backend. Everything here exercises the REST path and
// the registry fold.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use homedeck_core::controls::SliderControl;
use homedeck_core::{
    Command, CommandResult, CoreError, Dashboard, DashboardConfig, DashboardProfile, DeviceId,
    DeviceState, NoticeSeverity, PowerState,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn light1() -> serde_json::Value {
    json!({
        "id": "light1",
        "type": "light",
        "name": "Desk Lamp",
        "online": true,
        "state": { "state": "off", "brightness": 80 }
    })
}

async fn setup_with_devices(devices: serde_json::Value) -> (MockServer, Dashboard) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/device-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "type": "light",
                "name": "Light",
                "icon": "fa-lightbulb",
                "default_state": { "state": "off", "brightness": 100 }
            }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices))
        .mount(&server)
        .await;

    let config = DashboardConfig::new(
        Url::parse(&server.uri()).unwrap(),
        DashboardProfile::DeviceSimulator,
    );
    let dashboard = Dashboard::new(config).unwrap();
    dashboard.connect().await.unwrap();

    (server, dashboard)
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn initial_load_populates_the_registry() {
    let (_server, dashboard) = setup_with_devices(json!([light1()])).await;

    let snapshot = dashboard.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id.as_str(), "light1");
    assert_eq!(
        snapshot[0].state,
        DeviceState::Light {
            power: PowerState::Off,
            brightness: 80.0,
            color: None,
        }
    );

    dashboard.shutdown().await;
}

#[tokio::test]
async fn brightness_patch_folds_backend_echo_not_optimistic_value() {
    let (server, dashboard) = setup_with_devices(json!([light1()])).await;

    // The slider patch carries only the changed fields; the backend
    // echo additionally flips the power state.
    Mock::given(method("PUT"))
        .and(path("/api/devices/light1/state"))
        .and(body_json(json!({ "brightness": 40.0, "state": "on" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "state": "on", "brightness": 40 })),
        )
        .mount(&server)
        .await;

    let result = dashboard
        .execute(Command::PatchState {
            id: DeviceId::from("light1"),
            patch: SliderControl::Brightness.patch(40.0),
        })
        .await
        .unwrap();

    let device = match result {
        CommandResult::Device(device) => device,
        other => panic!("expected device result, got {other:?}"),
    };
    assert_eq!(
        device.state,
        DeviceState::Light {
            power: PowerState::On,
            brightness: 40.0,
            color: None,
        }
    );

    // The registry shows the confirmed state, not an intermediate one
    let snapshot = dashboard.snapshot();
    assert_eq!(snapshot[0].state, device.state);

    dashboard.shutdown().await;
}

#[tokio::test]
async fn toggle_goes_through_the_dedicated_request() {
    let (server, dashboard) = setup_with_devices(json!([light1()])).await;

    Mock::given(method("POST"))
        .and(path("/api/devices/light1/toggle"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "state": "on", "brightness": 80 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    dashboard
        .execute(Command::Toggle {
            id: DeviceId::from("light1"),
        })
        .await
        .unwrap();

    let snapshot = dashboard.snapshot();
    assert_eq!(snapshot[0].state.power(), Some(PowerState::On));

    dashboard.shutdown().await;
}

#[tokio::test]
async fn delete_requires_confirmation() {
    let (_server, dashboard) = setup_with_devices(json!([light1()])).await;

    let err = dashboard
        .execute(Command::Delete {
            id: DeviceId::from("light1"),
            confirmed: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ConfirmationRequired { .. }));

    // Nothing was removed and no request went out
    assert_eq!(dashboard.snapshot().len(), 1);

    dashboard.shutdown().await;
}

#[tokio::test]
async fn confirmed_delete_removes_after_backend_ack() {
    let (server, dashboard) = setup_with_devices(json!([light1()])).await;

    Mock::given(method("DELETE"))
        .and(path("/api/devices/light1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = dashboard
        .execute(Command::Delete {
            id: DeviceId::from("light1"),
            confirmed: true,
        })
        .await
        .unwrap();

    assert!(matches!(result, CommandResult::Deleted(id) if id.as_str() == "light1"));
    assert!(dashboard.snapshot().is_empty());

    dashboard.shutdown().await;
}

#[tokio::test]
async fn failed_command_keeps_registry_and_emits_notice() {
    let (server, dashboard) = setup_with_devices(json!([light1()])).await;
    let mut notices = dashboard.notices();

    Mock::given(method("PUT"))
        .and(path("/api/devices/light1/state"))
        .respond_with(ResponseTemplate::new(500).set_body_string("simulator on fire"))
        .mount(&server)
        .await;

    let err = dashboard
        .execute(Command::PatchState {
            id: DeviceId::from("light1"),
            patch: SliderControl::Brightness.patch(40.0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::CommandRejected { status: Some(500), .. }));

    // No optimistic mutation to roll back: still the loaded state
    assert_eq!(
        dashboard.snapshot()[0].state,
        DeviceState::Light {
            power: PowerState::Off,
            brightness: 80.0,
            color: None,
        }
    );

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.severity, NoticeSeverity::Error);
    assert!(notice.message.contains("simulator on fire"));

    dashboard.shutdown().await;
}

#[tokio::test]
async fn command_for_unknown_device_fails_without_a_request() {
    let (_server, dashboard) = setup_with_devices(json!([])).await;

    let err = dashboard
        .execute(Command::Toggle {
            id: DeviceId::from("ghost"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DeviceNotFound { .. }));

    dashboard.shutdown().await;
}

#[tokio::test]
async fn catalog_fetch_failure_falls_back_to_builtin_schemas() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/device-types"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([light1()])))
        .mount(&server)
        .await;

    let config = DashboardConfig::new(
        Url::parse(&server.uri()).unwrap(),
        DashboardProfile::DeviceSimulator,
    );
    let dashboard = Dashboard::new(config).unwrap();
    dashboard.connect().await.unwrap();

    // Still decodes lights via the built-in catalog
    assert!(matches!(
        dashboard.snapshot()[0].state,
        DeviceState::Light { .. }
    ));

    dashboard.shutdown().await;
}

#[tokio::test]
async fn import_resyncs_the_registry() {
    let (server, dashboard) = setup_with_devices(json!([])).await;
    assert!(dashboard.snapshot().is_empty());

    Mock::given(method("POST"))
        .and(path("/api/devices/import"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "imported": 1, "skipped": 0 })),
        )
        .mount(&server)
        .await;

    // After the import the device list includes the new row. The
    // higher priority lets this mock shadow the earlier empty one.
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([light1()])))
        .with_priority(1)
        .mount(&server)
        .await;

    let result = dashboard
        .execute(Command::Import {
            payload: json!({ "devices": [light1()] }),
        })
        .await
        .unwrap();

    match result {
        CommandResult::Import(report) => {
            assert_eq!(report.imported, 1);
            assert_eq!(report.skipped, 0);
        }
        other => panic!("expected import result, got {other:?}"),
    }
    assert_eq!(dashboard.snapshot().len(), 1);

    dashboard.shutdown().await;
}
