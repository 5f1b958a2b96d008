//! End-to-end workflow tests against a mocked workflow service.
//!
//! Drives the whole pipeline through [`Session`], the same path the TUI uses
//! minus the background task, and checks which requests reach the service.

use std::sync::Arc;

use serde_json::json;
use waypoint_engine::{
    AnalyticsStatus, BaselineStatus, DispatchError, DoctorStatus, GuardId, NotificationLevel,
    Operation, Session, StateStore, TimelineStatus, endpoint,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{backend_for, mount_all_operations, mount_failure, start_workflow_mock};

#[tokio::test]
async fn full_pipeline_reaches_committed_with_analytics() {
    let server = start_workflow_mock().await;
    mount_all_operations(&server).await;
    let backend = backend_for(&server);
    let mut session = Session::default();

    for operation in [
        Operation::CreateBaseline,
        Operation::GenerateTimeline,
        Operation::CommitTimeline,
        Operation::StartProgressTracking,
        Operation::RequestAnalytics,
    ] {
        session
            .dispatch(&backend, operation, json!({}))
            .await
            .unwrap_or_else(|err| panic!("{operation} failed: {err}"));
    }

    let state = session.state();
    assert_eq!(state.baseline_status(), BaselineStatus::Exists);
    assert_eq!(state.timeline_status(), TimelineStatus::Committed);
    assert_eq!(state.analytics_status(), AnalyticsStatus::Available);
    assert_eq!(state.doctor_status(), DoctorStatus::NotSubmitted);

    let requests = server.received_requests().await.expect("recording enabled");
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        vec![
            "/api/baseline",
            "/api/timeline/generate",
            "/api/timeline/commit",
            "/api/progress/start",
            "/api/analytics",
        ]
    );
}

#[tokio::test]
async fn commit_without_draft_never_reaches_the_service() {
    let server = start_workflow_mock().await;
    Mock::given(method("POST"))
        .and(path(endpoint(Operation::CommitTimeline)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let backend = backend_for(&server);
    let store = Arc::new(StateStore::new());
    store.set_baseline_status(BaselineStatus::Exists).unwrap();
    let mut session = Session::new(Arc::clone(&store));

    let err = session
        .dispatch(&backend, Operation::CommitTimeline, json!({}))
        .await
        .unwrap_err();

    let DispatchError::Guard(violation) = err else {
        panic!("expected a guard violation, got {err:?}");
    };
    assert_eq!(violation.operation_id, GuardId::DraftRequired);
    assert_eq!(
        violation.relevant_state.timeline_status(),
        Some(TimelineStatus::None)
    );
    assert_eq!(violation.relevant_state.baseline_status(), None);
    assert_eq!(store.get().timeline_status(), TimelineStatus::None);

    let notes = session.take_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level(), NotificationLevel::Warning);
    assert_eq!(notes[0].message(), "Please generate a draft timeline first");
}

#[tokio::test]
async fn rejected_generation_leaves_state_untouched() {
    let server = start_workflow_mock().await;
    mount_failure(
        &server,
        Operation::GenerateTimeline,
        500,
        "planner unavailable",
    )
    .await;
    let backend = backend_for(&server);
    let store = Arc::new(StateStore::new());
    store.set_baseline_status(BaselineStatus::Exists).unwrap();
    let before = store.get();
    let mut session = Session::new(Arc::clone(&store));

    let err = session
        .dispatch(&backend, Operation::GenerateTimeline, json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Backend(_)), "{err:?}");
    assert_eq!(store.get(), before);
    let notes = session.take_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level(), NotificationLevel::Error);
}

#[tokio::test]
async fn assessment_is_independent_of_the_timeline() {
    let server = start_workflow_mock().await;
    mount_all_operations(&server).await;
    let backend = backend_for(&server);
    let mut session = Session::default();

    let state = session
        .dispatch(&backend, Operation::SubmitAssessment, json!({"answers": [1, 2, 3]}))
        .await
        .expect("assessment accepted");

    assert_eq!(state.doctor_status(), DoctorStatus::Submitted);
    assert_eq!(state.baseline_status(), BaselineStatus::None);

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("json payload");
    assert_eq!(body, json!({"answers": [1, 2, 3]}));
}

#[tokio::test]
async fn subscribers_see_each_confirmed_step() {
    let server = start_workflow_mock().await;
    mount_all_operations(&server).await;
    let backend = backend_for(&server);
    let store = Arc::new(StateStore::new());
    let mut rx = store.subscribe();
    let mut session = Session::new(Arc::clone(&store));

    session
        .dispatch(&backend, Operation::CreateBaseline, json!({}))
        .await
        .unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(
        rx.borrow_and_update().baseline_status(),
        BaselineStatus::Exists
    );

    // Progress tracking confirms nothing locally.
    store.set_timeline_status(TimelineStatus::Draft).unwrap();
    store.commit_timeline().unwrap();
    rx.mark_unchanged();
    session
        .dispatch(&backend, Operation::StartProgressTracking, json!({}))
        .await
        .unwrap();
    assert!(!rx.has_changed().unwrap());
}
