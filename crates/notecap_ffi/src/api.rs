//! FFI use-case API for the entry screen shell.
//!
//! # Responsibility
//! - Expose capture orchestration to the UI shell via FRB.
//! - Translate host effects and attachment snapshots into plain envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - All calls run on the shell's UI thread; the session lock is never
//!   contended, it only makes the global sound.
//! - Every response carries the effects produced by that call, in order.

use crate::host::{EffectQueue, HostEffect};
use log::{error, warn};
use notecap_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CaptureCoordinator, CaptureError, CaptureState, CoreConfig, MediaKind, MediaReference,
    PermissionOutcome, ReconcileOutcome, StartOutcome,
};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

static SESSION: Mutex<Option<CaptureSession>> = Mutex::new(None);

struct CaptureSession {
    coordinator: CaptureCoordinator,
    queue: EffectQueue,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One attachment row for rendering and persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentItem {
    /// Stable attachment id; pass back to `attachment_remove`.
    pub attachment_id: String,
    pub uri: String,
    /// `photo|video|audio|document`.
    pub kind: String,
    /// Unix epoch milliseconds.
    pub captured_at: i64,
}

impl From<&MediaReference> for AttachmentItem {
    fn from(value: &MediaReference) -> Self {
        Self {
            attachment_id: value.id.to_string(),
            uri: value.uri.clone(),
            kind: value.kind.as_str().to_string(),
            captured_at: value.captured_at,
        }
    }
}

/// Response envelope shared by all capture calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResponse {
    /// Whether the call achieved its purpose.
    pub ok: bool,
    /// Human-readable diagnostics; empty on plain success.
    pub message: String,
    /// Effects the shell must perform now, in order.
    pub effects: Vec<HostEffect>,
    /// Attachment snapshot after the call.
    pub attachments: Vec<AttachmentItem>,
    /// Request id of the pending capture, if any.
    pub pending_request_id: Option<String>,
}

impl CaptureResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            effects: Vec::new(),
            attachments: Vec::new(),
            pending_request_id: None,
        }
    }
}

/// Configures the capture session from a JSON `CoreConfig`.
///
/// Replaces any previous session. A capture left pending by a previous
/// process is reloaded and reported via `pending_request_id`.
///
/// # FFI contract
/// - Sync call; opens the SQLite state file.
/// - Never panics; parse/validation errors are returned in `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn capture_configure(config_json: String) -> CaptureResponse {
    let config: CoreConfig = match serde_json::from_str(&config_json) {
        Ok(config) => config,
        Err(err) => return reject(format!("invalid config json: {err}")),
    };
    if let Err(err) = config.validate() {
        return reject(format!("invalid config: {err}"));
    }

    let queue = EffectQueue::default();
    let coordinator = match CaptureCoordinator::from_config(&config, queue.bindings()) {
        Ok(coordinator) => coordinator,
        Err(err) => {
            error!("event=ffi_configure module=ffi status=error error={err}");
            return reject(format!("capture_configure failed: {err}"));
        }
    };

    let mut session = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    let fresh = session.insert(CaptureSession { coordinator, queue });
    respond(fresh, Ok(String::new()))
}

/// Starts a camera capture.
///
/// `camera_granted` is the shell's current permission self-check.
#[flutter_rust_bridge::frb(sync)]
pub fn capture_start(kind: String, camera_granted: bool) -> CaptureResponse {
    let Some(kind) = MediaKind::parse(kind.trim()) else {
        return reject(format!("unknown media kind: `{kind}`"));
    };
    with_session(|session| {
        session.queue.set_camera_granted(camera_granted);
        let result = session
            .coordinator
            .start_capture(kind)
            .map(|outcome| match outcome {
                StartOutcome::Launched(_) => String::new(),
                StartOutcome::AwaitingPermission => "awaiting permission".to_string(),
            });
        respond(session, result)
    })
}

/// Delivers the OS answer to the camera permission dialog.
#[flutter_rust_bridge::frb(sync)]
pub fn capture_on_permission_result(granted: bool) -> CaptureResponse {
    with_session(|session| {
        session.queue.set_camera_granted(granted);
        let result = session
            .coordinator
            .on_permission_result(granted)
            .and_then(|outcome| match outcome {
                PermissionOutcome::Resumed(_) => Ok(String::new()),
                PermissionOutcome::Denied => Err(CaptureError::PermissionDenied),
                PermissionOutcome::NothingDeferred => Ok("nothing deferred".to_string()),
            });
        respond(session, result)
    })
}

/// Delivers the capture activity result.
///
/// Stale or malformed request ids are ignored and reported as `ok` with a
/// diagnostic message; the shell shows nothing for them.
#[flutter_rust_bridge::frb(sync)]
pub fn capture_on_result(request_id: String, success: bool) -> CaptureResponse {
    let Ok(request_id) = Uuid::parse_str(request_id.trim()) else {
        warn!("event=ffi_capture_result module=ffi status=stale reason=malformed_request_id");
        return with_session(|session| respond(session, Ok("stale result".to_string())));
    };
    with_session(|session| {
        let result = match session.coordinator.on_result(request_id, success) {
            ReconcileOutcome::Attached(_) => Ok(String::new()),
            ReconcileOutcome::Failed => Ok("capture failed".to_string()),
            ReconcileOutcome::Stale => Ok("stale result".to_string()),
        };
        respond(session, result)
    })
}

/// Abandons a capture recovered from a previous process.
///
/// The shell calls this once its result-redelivery window has passed.
#[flutter_rust_bridge::frb(sync)]
pub fn capture_abandon_orphaned() -> CaptureResponse {
    with_session(|session| {
        let result = session
            .coordinator
            .abandon_orphaned()
            .map(|abandoned| match abandoned {
                Some(_) => "orphaned capture abandoned".to_string(),
                None => String::new(),
            });
        respond(session, result)
    })
}

/// Appends a picked file or recorded audio clip.
#[flutter_rust_bridge::frb(sync)]
pub fn capture_import(uri: String, kind: String) -> CaptureResponse {
    let Some(kind) = MediaKind::parse(kind.trim()) else {
        return reject(format!("unknown media kind: `{kind}`"));
    };
    if uri.trim().is_empty() {
        return reject("uri must not be empty");
    }
    with_session(|session| {
        let result = session
            .coordinator
            .import_existing(uri.trim(), kind)
            .map(|_| String::new());
        respond(session, result)
    })
}

/// Removes one attachment by id. Unknown ids are a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn attachment_remove(attachment_id: String) -> CaptureResponse {
    let Ok(id) = Uuid::parse_str(attachment_id.trim()) else {
        return reject(format!("invalid attachment id: `{attachment_id}`"));
    };
    with_session(|session| {
        let message = if session.coordinator.remove_attachment(id) {
            String::new()
        } else {
            "attachment not found".to_string()
        };
        respond(session, Ok(message))
    })
}

/// Current attachment snapshot, empty when unconfigured.
#[flutter_rust_bridge::frb(sync)]
pub fn attachments_snapshot() -> Vec<AttachmentItem> {
    let session = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    session
        .as_ref()
        .map(|session| snapshot_items(&session.coordinator))
        .unwrap_or_default()
}

/// Capture state projection: `unconfigured|idle|pending|recovered`.
#[flutter_rust_bridge::frb(sync)]
pub fn capture_state() -> String {
    let session = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    match session.as_ref().map(|session| session.coordinator.state()) {
        None => "unconfigured".to_string(),
        Some(CaptureState::Idle) => "idle".to_string(),
        Some(CaptureState::Pending {
            recovered: false, ..
        }) => "pending".to_string(),
        Some(CaptureState::Pending {
            recovered: true, ..
        }) => "recovered".to_string(),
    }
}

fn with_session(call: impl FnOnce(&mut CaptureSession) -> CaptureResponse) -> CaptureResponse {
    let mut session = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    match session.as_mut() {
        Some(session) => call(session),
        None => CaptureResponse::failure("capture session is not configured"),
    }
}

/// Failure envelope for input rejected before reaching the coordinator.
///
/// Still carries the current snapshot so the shell keeps rendering it.
fn reject(message: impl Into<String>) -> CaptureResponse {
    let mut session = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    match session.as_mut() {
        Some(session) => envelope(session, false, message.into()),
        None => CaptureResponse::failure(message),
    }
}

fn respond(session: &mut CaptureSession, result: Result<String, CaptureError>) -> CaptureResponse {
    match result {
        Ok(message) => envelope(session, true, message),
        Err(err) => envelope(session, false, err.to_string()),
    }
}

fn envelope(session: &mut CaptureSession, ok: bool, message: String) -> CaptureResponse {
    CaptureResponse {
        ok,
        message,
        effects: session.queue.drain(),
        attachments: snapshot_items(&session.coordinator),
        pending_request_id: session
            .coordinator
            .pending_target()
            .map(|target| target.request_id.to_string()),
    }
}

fn snapshot_items(coordinator: &CaptureCoordinator) -> Vec<AttachmentItem> {
    coordinator
        .attachments()
        .snapshot()
        .iter()
        .map(AttachmentItem::from)
        .collect()
}
