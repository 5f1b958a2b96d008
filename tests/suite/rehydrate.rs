//! Startup rehydration from the workflow service's status endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use waypoint_engine::{
    AnalyticsStatus, App, AppOptions, BackendSettings, BaselineStatus, DispatchError,
    DoctorStatus, HttpBackend, InvalidTransitionError, Session, StateModel, StateStore,
    TimelineStatus,
};

use crate::common::{backend_for, mount_status, settle, start_workflow_mock, toast_messages};

#[tokio::test]
async fn committed_snapshot_unlocks_analytics() {
    let server = start_workflow_mock().await;
    mount_status(
        &server,
        json!({
            "baselineStatus": "EXISTS",
            "timelineStatus": "COMMITTED",
            "doctorStatus": "SUBMITTED",
        }),
    )
    .await;
    let mut session = Session::default();

    let state = session
        .rehydrate(&backend_for(&server))
        .await
        .expect("snapshot applies");

    assert_eq!(state.timeline_status(), TimelineStatus::Committed);
    assert_eq!(state.analytics_status(), AnalyticsStatus::Available);
    assert_eq!(state.doctor_status(), DoctorStatus::Submitted);
}

#[tokio::test]
async fn inconsistent_snapshot_is_rejected() {
    let server = start_workflow_mock().await;
    mount_status(
        &server,
        json!({
            "baselineStatus": "NONE",
            "timelineStatus": "DRAFT",
        }),
    )
    .await;
    let mut session = Session::default();

    let err = session.rehydrate(&backend_for(&server)).await.unwrap_err();

    assert!(
        matches!(
            err,
            DispatchError::Transition(InvalidTransitionError::TimelineWithoutBaseline { .. })
        ),
        "{err:?}"
    );
    assert_eq!(session.state().baseline_status(), BaselineStatus::None);
    assert_eq!(session.take_notifications().len(), 1);
}

#[tokio::test]
async fn snapshot_cannot_move_state_backward() {
    let server = start_workflow_mock().await;
    mount_status(&server, json!({})).await;
    let store = Arc::new(StateStore::new());
    store.set_baseline_status(BaselineStatus::Exists).unwrap();
    let mut session = Session::new(Arc::clone(&store));

    let err = session.rehydrate(&backend_for(&server)).await.unwrap_err();

    assert!(
        matches!(
            err,
            DispatchError::Transition(InvalidTransitionError::Regression { .. })
        ),
        "{err:?}"
    );
    assert_eq!(store.get().baseline_status(), BaselineStatus::Exists);
}

#[tokio::test]
async fn returning_user_keeps_a_gated_start_path() {
    let server = start_workflow_mock().await;
    mount_status(
        &server,
        json!({
            "baselineStatus": "EXISTS",
            "timelineStatus": "COMMITTED",
        }),
    )
    .await;
    let options = AppOptions {
        start_path: "/progress".to_owned(),
        ..AppOptions::default()
    };
    let mut app = App::new(backend_for(&server), options);
    assert!(!app.should_render_screen());

    settle(&mut app).await;

    assert_eq!(app.current_path(), "/progress");
    assert!(app.should_render_screen());
    assert!(toast_messages(&app).is_empty());
}

#[tokio::test]
async fn committed_snapshot_moves_the_open_draft_screen_on() {
    let server = start_workflow_mock().await;
    mount_status(
        &server,
        json!({
            "baselineStatus": "EXISTS",
            "timelineStatus": "COMMITTED",
        }),
    )
    .await;
    let store = StateStore::new();
    store.set_baseline_status(BaselineStatus::Exists).unwrap();
    store.set_timeline_status(TimelineStatus::Draft).unwrap();
    let options = AppOptions {
        start_path: "/timeline/draft".to_owned(),
        ..AppOptions::default()
    };
    let mut app = App::with_store(backend_for(&server), Arc::new(store), options);
    assert!(app.should_render_screen());

    app.rehydrate();
    assert!(app.is_busy());
    settle(&mut app).await;

    assert_eq!(app.state().analytics_status(), AnalyticsStatus::Available);
    assert_eq!(app.current_path(), "/progress");
    assert_eq!(
        toast_messages(&app),
        vec!["Please generate a draft timeline first"]
    );
}

#[tokio::test]
async fn unreachable_service_surfaces_an_error_toast() {
    let backend = HttpBackend::new(&BackendSettings {
        base_url: "http://127.0.0.1:1".to_owned(),
        timeout: Duration::from_secs(1),
    })
    .expect("client builds");
    let mut app = App::new(backend, AppOptions::default());
    settle(&mut app).await;

    assert_eq!(
        toast_messages(&app),
        vec!["Could not reach the workflow service"]
    );
    assert_eq!(app.state(), StateModel::initial());
}
