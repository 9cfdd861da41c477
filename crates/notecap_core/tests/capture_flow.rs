mod common;

use common::{count_files, Harness, ScriptedUris};
use notecap_core::{
    CaptureError, CaptureState, EntryDraft, EntryFormConfig, LaunchError, MediaKind,
    ReconcileOutcome, StartOutcome, UserNotice,
};
use uuid::Uuid;

fn launched(outcome: StartOutcome) -> notecap_core::CaptureTarget {
    match outcome {
        StartOutcome::Launched(target) => target,
        other => panic!("expected launch, got {other:?}"),
    }
}

#[test]
fn denied_permission_never_allocates() {
    let mut harness = Harness::new(false);
    for kind in [MediaKind::Photo, MediaKind::Video] {
        harness.coordinator.start_capture(kind).unwrap();
    }
    harness.coordinator.on_permission_result(false).unwrap();

    for kind in [MediaKind::Photo, MediaKind::Video] {
        let err = harness.coordinator.start_capture(kind).unwrap_err();
        assert!(matches!(err, CaptureError::PermissionDenied));
    }

    assert_eq!(harness.uris.mint_calls(), 0);
    assert_eq!(count_files(&harness.media_root()), 0);
    assert!(harness.host.launches().is_empty());
}

#[test]
fn scenario_a_denied_capture_leaves_list_empty_and_idle() {
    let mut harness = Harness::new(false);
    let outcome = harness.coordinator.start_capture(MediaKind::Photo).unwrap();
    assert_eq!(outcome, StartOutcome::AwaitingPermission);

    harness.coordinator.on_permission_result(false).unwrap();

    assert!(harness.coordinator.attachments().is_empty());
    assert_eq!(harness.coordinator.state(), &CaptureState::Idle);
    assert_eq!(harness.host.notices(), vec![UserNotice::PermissionDenied]);
}

#[test]
fn scenario_b_successful_video_capture_is_attached() {
    let uris = ScriptedUris::with(&["file:///videos/v1"]);
    let mut harness = Harness::with(true, EntryFormConfig::note(), uris);

    let target = launched(harness.coordinator.start_capture(MediaKind::Video).unwrap());
    assert_eq!(target.uri, "file:///videos/v1");
    assert_eq!(harness.host.launches(), vec![target.clone()]);

    let outcome = harness.coordinator.on_result(target.request_id, true);
    assert!(matches!(outcome, ReconcileOutcome::Attached(_)));

    let snapshot = harness.coordinator.attachments().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].uri, "file:///videos/v1");
    assert_eq!(snapshot[0].kind, MediaKind::Video);
    assert_eq!(harness.coordinator.state(), &CaptureState::Idle);
}

#[test]
fn scenario_c_second_start_is_busy_and_first_still_completes() {
    let mut harness = Harness::new(true);
    let first = launched(harness.coordinator.start_capture(MediaKind::Photo).unwrap());

    let err = harness
        .coordinator
        .start_capture(MediaKind::Photo)
        .unwrap_err();
    match err {
        CaptureError::Busy { pending } => assert_eq!(pending, first.request_id),
        other => panic!("expected busy, got {other}"),
    }
    assert_eq!(harness.coordinator.pending_target(), Some(&first));
    assert_eq!(harness.host.launches().len(), 1);
    assert_eq!(harness.uris.mint_calls(), 1);

    harness.coordinator.on_result(first.request_id, true);
    let snapshot = harness.coordinator.attachments().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].uri, first.uri);
    assert_eq!(snapshot[0].kind, MediaKind::Photo);
}

#[test]
fn scenario_d_late_result_after_restart_is_attributed() {
    let mut harness = Harness::new(true);
    let target = launched(harness.coordinator.start_capture(MediaKind::Video).unwrap());

    let mut harness = harness.restart(true);
    assert_eq!(
        harness.coordinator.state(),
        &CaptureState::Pending {
            target: target.clone(),
            recovered: true
        }
    );

    let outcome = harness.coordinator.on_result(target.request_id, true);
    assert!(matches!(outcome, ReconcileOutcome::Attached(_)));
    let snapshot = harness.coordinator.attachments().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].uri, target.uri);

    // The durable record is gone: another restart comes up idle.
    let harness = harness.restart(true);
    assert_eq!(harness.coordinator.state(), &CaptureState::Idle);
}

#[test]
fn failed_result_discards_target_and_notifies() {
    let mut harness = Harness::new(true);
    let target = launched(harness.coordinator.start_capture(MediaKind::Video).unwrap());
    assert!(target.file_path.exists());

    let outcome = harness.coordinator.on_result(target.request_id, false);

    assert_eq!(outcome, ReconcileOutcome::Failed);
    assert!(harness.coordinator.attachments().is_empty());
    assert_eq!(harness.coordinator.state(), &CaptureState::Idle);
    assert!(!target.file_path.exists());
    assert_eq!(
        harness.host.notices(),
        vec![UserNotice::CaptureFailed(MediaKind::Video)]
    );
}

#[test]
fn results_while_idle_or_mismatched_are_stale_and_silent() {
    let mut harness = Harness::new(true);
    assert_eq!(
        harness.coordinator.on_result(Uuid::new_v4(), true),
        ReconcileOutcome::Stale
    );

    let target = launched(harness.coordinator.start_capture(MediaKind::Photo).unwrap());
    assert_eq!(
        harness.coordinator.on_result(Uuid::new_v4(), true),
        ReconcileOutcome::Stale
    );
    assert_eq!(harness.coordinator.pending_target(), Some(&target));

    harness.coordinator.on_result(target.request_id, true);
    // Duplicate delivery of the same result.
    assert_eq!(
        harness.coordinator.on_result(target.request_id, true),
        ReconcileOutcome::Stale
    );

    assert_eq!(harness.coordinator.attachments().len(), 1);
    assert!(harness.host.notices().is_empty());
}

#[test]
fn launch_failure_returns_to_idle_without_leftovers() {
    let mut harness = Harness::new(true);
    harness.host.lock().launch_error = Some(LaunchError::NoCaptureActivity);

    let err = harness
        .coordinator
        .start_capture(MediaKind::Photo)
        .unwrap_err();

    assert!(matches!(err, CaptureError::CaptureFailed(_)));
    assert_eq!(harness.coordinator.state(), &CaptureState::Idle);
    assert_eq!(count_files(&harness.media_root()), 0);
    assert_eq!(
        harness.host.notices(),
        vec![UserNotice::CaptureFailed(MediaKind::Photo)]
    );

    let harness = harness.restart(true);
    assert_eq!(harness.coordinator.state(), &CaptureState::Idle);
}

#[test]
fn orphan_is_abandoned_before_new_request() {
    let mut harness = Harness::new(true);
    let orphan = launched(harness.coordinator.start_capture(MediaKind::Photo).unwrap());

    let mut harness = harness.restart(true);
    harness.clock.set(1_700_000_000_500);
    let fresh = launched(harness.coordinator.start_capture(MediaKind::Video).unwrap());

    assert_ne!(fresh.request_id, orphan.request_id);
    assert!(!orphan.file_path.exists());
    assert_eq!(
        harness.host.notices(),
        vec![UserNotice::CaptureFailed(MediaKind::Photo)]
    );
    assert_eq!(
        harness.coordinator.on_result(orphan.request_id, true),
        ReconcileOutcome::Stale
    );
    assert!(harness.coordinator.attachments().is_empty());
}

#[test]
fn abandon_orphaned_leaves_live_pending_alone() {
    let mut harness = Harness::new(true);
    let live = launched(harness.coordinator.start_capture(MediaKind::Photo).unwrap());

    assert_eq!(harness.coordinator.abandon_orphaned().unwrap(), None);
    assert_eq!(harness.coordinator.pending_target(), Some(&live));

    let mut harness = harness.restart(true);
    let abandoned = harness.coordinator.abandon_orphaned().unwrap();
    assert_eq!(abandoned, Some(live));
    assert_eq!(harness.coordinator.state(), &CaptureState::Idle);
}

#[test]
fn kinds_outside_form_config_are_rejected() {
    let mut harness = Harness::with(true, EntryFormConfig::reminder(), ScriptedUris::default());

    let err = harness
        .coordinator
        .start_capture(MediaKind::Audio)
        .unwrap_err();
    assert!(matches!(err, CaptureError::KindNotPermitted(MediaKind::Audio)));

    let err = harness
        .coordinator
        .import_existing("content://media/external/audio/1", MediaKind::Audio)
        .unwrap_err();
    assert!(matches!(err, CaptureError::KindNotPermitted(MediaKind::Audio)));
    assert_eq!(harness.uris.mint_calls(), 0);
}

#[test]
fn import_and_capture_share_one_ordered_list() {
    let mut harness = Harness::new(true);
    let picked = harness
        .coordinator
        .import_existing("content://media/external/images/7", MediaKind::Photo)
        .unwrap();
    let target = launched(harness.coordinator.start_capture(MediaKind::Video).unwrap());
    // Import while a capture is pending is independent of the state machine.
    let audio = harness
        .coordinator
        .import_existing("content://recordings/a1", MediaKind::Audio)
        .unwrap();
    harness.coordinator.on_result(target.request_id, true);

    let snapshot = harness.coordinator.attachments().snapshot();
    let uris: Vec<&str> = snapshot.iter().map(|item| item.uri.as_str()).collect();
    assert_eq!(
        uris,
        vec![picked.uri.as_str(), audio.uri.as_str(), target.uri.as_str()]
    );

    assert!(harness.coordinator.remove_attachment(audio.id));
    assert!(!harness.coordinator.remove_attachment(audio.id));
    assert_eq!(harness.coordinator.attachments().len(), 2);

    let draft = EntryDraft::new("Trip", "notes").with_attachments(
        harness.coordinator.attachments().snapshot(),
    );
    assert!(draft.is_valid(harness.coordinator.form()));
    assert_eq!(draft.attachments.len(), 2);
}

#[test]
fn repeated_attempts_keep_form_usable() {
    let mut harness = Harness::new(true);
    for round in 0..3 {
        harness.clock.set(1_700_000_000_000 + round);
        let target = launched(harness.coordinator.start_capture(MediaKind::Photo).unwrap());
        harness.coordinator.on_result(target.request_id, round % 2 == 0);
    }
    assert_eq!(harness.coordinator.attachments().len(), 2);
    assert_eq!(harness.coordinator.state(), &CaptureState::Idle);
}
