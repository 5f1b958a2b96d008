//! Shared test utilities and fixtures
//!
//! A wiremock server standing in for the workflow service.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;
use waypoint_engine::{App, BackendSettings, HttpBackend, Operation, STATUS_PATH, endpoint};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start a mock server that simulates the workflow service
pub async fn start_workflow_mock() -> MockServer {
    MockServer::start().await
}

pub fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&BackendSettings {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    })
    .expect("client builds")
}

/// Accept `operation` with a 200 and an empty JSON object.
pub async fn mount_operation(server: &MockServer, operation: Operation) {
    Mock::given(method("POST"))
        .and(path(endpoint(operation)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
}

/// Accept every operation the workflow exposes.
pub async fn mount_all_operations(server: &MockServer) {
    for operation in Operation::ALL {
        mount_operation(server, operation).await;
    }
}

/// Fail `operation` with the given status and body.
pub async fn mount_failure(server: &MockServer, operation: Operation, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(endpoint(operation)))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Serve a status snapshot, using the service's camelCase wire names.
pub async fn mount_status(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Tick `app` until no backend work is outstanding.
pub async fn settle(app: &mut App) {
    for _ in 0..400 {
        app.tick();
        if !app.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("backend work did not finish");
}

/// Messages of the toasts currently on screen.
pub fn toast_messages(app: &App) -> Vec<String> {
    app.toasts().map(|n| n.message().to_owned()).collect()
}
