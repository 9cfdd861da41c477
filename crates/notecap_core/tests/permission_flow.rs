mod common;

use common::Harness;
use notecap_core::{
    CaptureError, CaptureState, CaptureStateRepository, Continuation, DeferredAction, MediaKind,
    Permission, PermissionOutcome, PermissionState, ReconcileOutcome,
    SqliteCaptureStateRepository, StartOutcome,
};

#[test]
fn grant_resumes_deferred_capture_exactly_once() {
    let mut harness = Harness::new(false);
    let outcome = harness.coordinator.start_capture(MediaKind::Video).unwrap();
    assert_eq!(outcome, StartOutcome::AwaitingPermission);
    assert_eq!(harness.uris.mint_calls(), 0);

    let resumed = harness.coordinator.on_permission_result(true).unwrap();
    let target = match resumed {
        PermissionOutcome::Resumed(StartOutcome::Launched(target)) => target,
        other => panic!("expected resumed launch, got {other:?}"),
    };
    assert_eq!(target.kind, MediaKind::Video);
    assert_eq!(harness.host.launches().len(), 1);

    // A second grant event has nothing left to resume.
    let again = harness.coordinator.on_permission_result(true).unwrap();
    assert_eq!(again, PermissionOutcome::NothingDeferred);
    assert_eq!(harness.host.launches().len(), 1);
    assert_eq!(
        harness.coordinator.permission_state(),
        PermissionState::Granted
    );
}

#[test]
fn presses_during_prompt_are_coalesced_into_one_dialog() {
    let mut harness = Harness::new(false);
    harness.coordinator.start_capture(MediaKind::Photo).unwrap();
    harness.coordinator.start_capture(MediaKind::Video).unwrap();
    harness.coordinator.start_capture(MediaKind::Photo).unwrap();
    assert_eq!(harness.host.permission_requests(), 1);

    let resumed = harness.coordinator.on_permission_result(true).unwrap();
    match resumed {
        PermissionOutcome::Resumed(StartOutcome::Launched(target)) => {
            assert_eq!(target.kind, MediaKind::Photo);
        }
        other => panic!("expected resumed launch, got {other:?}"),
    }
    assert_eq!(harness.host.launches().len(), 1);
}

#[test]
fn denial_clears_deferred_action() {
    let mut harness = Harness::new(false);
    harness.coordinator.start_capture(MediaKind::Photo).unwrap();

    assert_eq!(
        harness.coordinator.on_permission_result(false).unwrap(),
        PermissionOutcome::Denied
    );
    assert_eq!(
        harness.coordinator.permission_state(),
        PermissionState::Denied
    );

    let conn = notecap_core::db::open_db(harness.db_path()).unwrap();
    let store = SqliteCaptureStateRepository::new(conn);
    assert_eq!(store.load_deferred(Permission::Camera).unwrap(), None);
}

#[test]
fn deferred_action_survives_restart_during_prompt() {
    let mut harness = Harness::new(false);
    harness.coordinator.start_capture(MediaKind::Video).unwrap();

    // Process dies while the dialog is showing; the answer is redelivered.
    let mut harness = harness.restart(false);
    assert_eq!(
        harness.coordinator.permission_state(),
        PermissionState::Unknown
    );

    let resumed = harness.coordinator.on_permission_result(true).unwrap();
    let target = match resumed {
        PermissionOutcome::Resumed(StartOutcome::Launched(target)) => target,
        other => panic!("expected resumed launch, got {other:?}"),
    };
    assert_eq!(target.kind, MediaKind::Video);

    let outcome = harness.coordinator.on_result(target.request_id, true);
    assert!(matches!(outcome, ReconcileOutcome::Attached(_)));
    assert_eq!(harness.coordinator.state(), &CaptureState::Idle);
}

#[test]
fn granted_self_check_skips_prompt() {
    let mut harness = Harness::new(true);
    let outcome = harness.coordinator.start_capture(MediaKind::Photo).unwrap();
    assert!(matches!(outcome, StartOutcome::Launched(_)));
    assert_eq!(harness.host.permission_requests(), 0);
}

#[test]
fn new_prompt_after_restart_replaces_unanswered_action() {
    let mut harness = Harness::new(false);
    harness.coordinator.start_capture(MediaKind::Photo).unwrap();

    // The first dialog's answer is never redelivered.
    let mut harness = harness.restart(false);
    let outcome = harness.coordinator.start_capture(MediaKind::Video).unwrap();
    assert_eq!(outcome, StartOutcome::AwaitingPermission);
    assert_eq!(harness.host.permission_requests(), 1);

    let resumed = harness.coordinator.on_permission_result(true).unwrap();
    match resumed {
        PermissionOutcome::Resumed(StartOutcome::Launched(target)) => {
            assert_eq!(target.kind, MediaKind::Video);
        }
        other => panic!("expected resumed launch, got {other:?}"),
    }
    assert_eq!(harness.host.launches().len(), 1);
}

#[test]
fn self_check_grant_drops_leftover_action() {
    let mut harness = Harness::new(false);
    harness.coordinator.start_capture(MediaKind::Photo).unwrap();

    // Granted from system settings while the app was gone.
    let mut harness = harness.restart(true);
    let target = match harness.coordinator.start_capture(MediaKind::Video).unwrap() {
        StartOutcome::Launched(target) => target,
        other => panic!("expected launch, got {other:?}"),
    };
    assert_eq!(target.kind, MediaKind::Video);
    assert_eq!(harness.host.permission_requests(), 0);

    let conn = notecap_core::db::open_db(harness.db_path()).unwrap();
    let store = SqliteCaptureStateRepository::new(conn);
    assert_eq!(store.load_deferred(Permission::Camera).unwrap(), None);

    harness.coordinator.on_result(target.request_id, true);
    // A late grant redelivered for the old dialog resumes nothing.
    assert_eq!(
        harness.coordinator.on_permission_result(true).unwrap(),
        PermissionOutcome::NothingDeferred
    );
    assert_eq!(harness.host.launches().len(), 1);
    assert!(harness.host.notices().is_empty());
    assert_eq!(harness.coordinator.attachments().len(), 1);
}

#[test]
fn cached_denial_drops_leftover_action() {
    let mut harness = Harness::new(false);
    harness.coordinator.start_capture(MediaKind::Photo).unwrap();
    harness.coordinator.on_permission_result(false).unwrap();

    let conn = notecap_core::db::open_db(harness.db_path()).unwrap();
    let store = SqliteCaptureStateRepository::new(conn);
    // Row written by an earlier process that never saw its answer.
    store
        .record_deferred(&DeferredAction {
            permission: Permission::Camera,
            kind: MediaKind::Photo,
            continuation: Continuation::StartCapture,
            recorded_at: 1,
        })
        .unwrap();

    let err = harness
        .coordinator
        .start_capture(MediaKind::Video)
        .unwrap_err();
    assert!(matches!(err, CaptureError::PermissionDenied));
    assert_eq!(store.load_deferred(Permission::Camera).unwrap(), None);
}
