//! Navigation Guard behavior through the hosting shell.

use std::sync::Arc;

use waypoint_engine::{
    App, AppOptions, BaselineStatus, DEFAULT_START_PATH, DispatchStatus, GuardPhase, Operation,
    ScreenId, StateStore, TimelineStatus,
};

use crate::common::{
    backend_for, mount_all_operations, mount_status, settle, start_workflow_mock,
    toast_messages,
};

fn options_at(path: &str) -> AppOptions {
    AppOptions {
        start_path: path.to_owned(),
        ..AppOptions::default()
    }
}

fn fresh_app(server: &wiremock::MockServer, options: AppOptions) -> App {
    App::with_store(backend_for(server), Arc::new(StateStore::new()), options)
}

#[tokio::test]
async fn every_gated_deep_link_lands_on_upload_from_scratch() {
    let server = start_workflow_mock().await;
    mount_status(&server, serde_json::json!({})).await;
    for path in [
        "/timeline/generate",
        "/timeline/draft",
        "/timeline/committed",
        "/progress",
        "/dashboard",
        "/analytics",
        "/assessment/results",
    ] {
        let mut app = App::new(backend_for(&server), options_at(path));
        assert_eq!(app.guard_phase(), GuardPhase::Checking, "deep link {path}");
        assert_eq!(app.current_path(), path);

        settle(&mut app).await;
        assert_eq!(app.current_path(), DEFAULT_START_PATH, "deep link {path}");
        assert_eq!(app.guard_phase(), GuardPhase::Valid);
        assert_eq!(toast_messages(&app).len(), 1, "deep link {path}");
    }
}

#[tokio::test]
async fn nested_paths_inherit_their_parent_screen_guard() {
    let server = start_workflow_mock().await;
    let app = fresh_app(&server, options_at("/timeline/draft/week-3"));
    assert_eq!(app.current_path(), "/upload");

    let app = fresh_app(&server, options_at("/assessment/intro"));
    assert_eq!(app.current_path(), "/assessment/intro");
    assert_eq!(app.current_screen(), Some(ScreenId::Assessment));
}

#[tokio::test]
async fn unknown_paths_are_not_gated() {
    let server = start_workflow_mock().await;
    let app = fresh_app(&server, options_at("/help"));
    assert_eq!(app.current_path(), "/help");
    assert_eq!(app.current_screen(), None);
    assert!(app.should_render_screen());
    assert!(app.toasts().next().is_none());
}

#[tokio::test]
async fn back_returns_to_the_screen_before_a_redirect() {
    let server = start_workflow_mock().await;
    let mut app = fresh_app(&server, options_at("/assessment"));

    app.navigate("/dashboard");
    app.navigate("/analytics");
    assert_eq!(app.current_path(), "/upload");

    app.back();
    assert_eq!(app.current_path(), "/assessment");
    assert_eq!(app.guard_phase(), GuardPhase::Valid);
}

#[tokio::test]
async fn stale_draft_screen_moves_on_after_commit() {
    let server = start_workflow_mock().await;
    mount_all_operations(&server).await;
    let store = StateStore::new();
    store.set_baseline_status(BaselineStatus::Exists).unwrap();
    store.set_timeline_status(TimelineStatus::Draft).unwrap();
    let mut app = App::with_store(
        backend_for(&server),
        Arc::new(store),
        options_at("/timeline/draft"),
    );
    assert_eq!(app.current_screen(), Some(ScreenId::TimelineDraft));
    assert_eq!(app.available_actions(), vec![Operation::CommitTimeline]);

    assert_eq!(app.dispatch(Operation::CommitTimeline), DispatchStatus::Sent);
    settle(&mut app).await;

    assert_eq!(app.current_path(), "/progress");
    assert_eq!(app.current_screen(), Some(ScreenId::Progress));
    assert!(app.should_render_screen());
}

#[tokio::test]
async fn menu_reflects_reachability_as_the_workflow_advances() {
    let server = start_workflow_mock().await;
    mount_all_operations(&server).await;
    let mut app = fresh_app(&server, AppOptions::default());

    let reachable = |app: &App| -> Vec<ScreenId> {
        app.menu_entries()
            .filter(|entry| entry.reachable)
            .map(|entry| entry.screen)
            .collect()
    };
    assert_eq!(
        reachable(&app),
        vec![ScreenId::Upload, ScreenId::Assessment]
    );

    app.dispatch(Operation::CreateBaseline);
    settle(&mut app).await;
    assert_eq!(
        reachable(&app),
        vec![
            ScreenId::Upload,
            ScreenId::TimelineGenerate,
            ScreenId::Assessment,
        ]
    );
}
