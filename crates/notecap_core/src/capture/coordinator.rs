//! Capture orchestration state machine.
//!
//! # Responsibility
//! - Gate camera capture behind the runtime permission.
//! - Allocate a target, persist it, launch the external activity.
//! - Reconcile the async result into the attachment list exactly once.
//!
//! # Invariants
//! - `Idle --start(granted)--> Pending --on_result--> Idle`.
//! - A live `Pending` target rejects new requests with `Busy`; it is never
//!   replaced.
//! - The pending target is persisted before launch and cleared on
//!   reconciliation, so a late result after restart is still attributed.
//! - A reference is appended only for a successful result whose request id
//!   matches the pending target.
//!
//! # See also
//! - `repo::capture_repo` for the durable record layout.

use crate::attachments::AttachmentList;
use crate::capture::error::{CaptureError, CaptureResult};
use crate::capture::host::{CaptureLauncher, HostBindings, UserNotice, UserNotifier};
use crate::clock::SystemClock;
use crate::config::CoreConfig;
use crate::db::open_db;
use crate::media::location::MediaLocationFactory;
use crate::media::uri::FileProviderUris;
use crate::model::entry::EntryFormConfig;
use crate::model::media::{AttachmentId, CaptureTarget, MediaKind, MediaReference, RequestId};
use crate::permission::{
    Continuation, DeferredAction, Permission, PermissionDecision, PermissionGate, PermissionState,
};
use crate::repo::capture_repo::{CaptureStateRepository, SqliteCaptureStateRepository};
use log::{error, info, warn};

/// Coordinator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Pending {
        target: CaptureTarget,
        /// Reloaded from durable state on startup rather than launched by
        /// this process.
        recovered: bool,
    },
}

/// Successful outcome of `start_capture`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The external activity was launched with this target.
    Launched(CaptureTarget),
    /// The permission dialog is showing; the capture resumes on grant.
    AwaitingPermission,
}

/// Outcome of `on_result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Attached(MediaReference),
    /// Failure or cancellation; the target was discarded.
    Failed,
    /// No matching pending target; nothing changed.
    Stale,
}

/// Outcome of `on_permission_result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionOutcome {
    /// The deferred capture was re-invoked.
    Resumed(StartOutcome),
    Denied,
    /// Granted, but no action was waiting for it.
    NothingDeferred,
}

pub struct CaptureCoordinator {
    form: EntryFormConfig,
    permissions: PermissionGate,
    locations: MediaLocationFactory,
    store: Box<dyn CaptureStateRepository>,
    launcher: Box<dyn CaptureLauncher>,
    notifier: Box<dyn UserNotifier>,
    attachments: AttachmentList,
    state: CaptureState,
}

impl CaptureCoordinator {
    /// Builds a coordinator, reloading any pending target from `store`.
    ///
    /// # Errors
    /// - `Store` when durable state cannot be read.
    pub fn restore(
        form: EntryFormConfig,
        locations: MediaLocationFactory,
        store: Box<dyn CaptureStateRepository>,
        host: HostBindings,
    ) -> CaptureResult<Self> {
        let state = match store.load_pending()? {
            Some(target) => {
                info!(
                    "event=capture_restore module=capture status=recovered kind={} request_id={}",
                    target.kind.as_str(),
                    target.request_id
                );
                CaptureState::Pending {
                    target,
                    recovered: true,
                }
            }
            None => CaptureState::Idle,
        };

        Ok(Self {
            form,
            permissions: PermissionGate::new(host.permissions),
            locations,
            store,
            launcher: host.launcher,
            notifier: host.notifier,
            attachments: AttachmentList::new(),
            state,
        })
    }

    /// Production wiring: SQLite store at `db_path`, file-provider URIs and
    /// the system clock.
    ///
    /// # Errors
    /// - `Store` when the database cannot be opened or read.
    pub fn from_config(config: &CoreConfig, host: HostBindings) -> CaptureResult<Self> {
        let conn = open_db(&config.db_path)?;
        let uris = FileProviderUris::new(config.file_provider_authority(), &config.media_root);
        let locations = MediaLocationFactory::new(
            config.media_root.clone(),
            Box::new(uris),
            Box::new(SystemClock),
        );
        Self::restore(
            config.form.clone(),
            locations,
            Box::new(SqliteCaptureStateRepository::new(conn)),
            host,
        )
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn pending_target(&self) -> Option<&CaptureTarget> {
        match &self.state {
            CaptureState::Pending { target, .. } => Some(target),
            CaptureState::Idle => None,
        }
    }

    pub fn form(&self) -> &EntryFormConfig {
        &self.form
    }

    pub fn attachments(&self) -> &AttachmentList {
        &self.attachments
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permissions.state(Permission::Camera)
    }

    /// Replaces the attachment list, e.g. when an existing entry is opened.
    pub fn load_attachments(&mut self, items: Vec<MediaReference>) {
        self.attachments = AttachmentList::from_existing(items);
    }

    /// Starts a camera capture of `kind`.
    ///
    /// # Errors
    /// - `KindNotPermitted` when the form does not offer camera `kind`.
    /// - `Busy` while a live capture is pending.
    /// - `PermissionDenied` when the camera permission is denied.
    /// - `Allocation` when no target could be allocated.
    /// - `Store` when the target could not be persisted.
    /// - `CaptureFailed` when the host could not launch the activity.
    pub fn start_capture(&mut self, kind: MediaKind) -> CaptureResult<StartOutcome> {
        if !kind.is_camera_capture() || !self.form.permits(kind) {
            warn!(
                "event=capture_start module=capture status=rejected kind={} reason=kind_not_permitted",
                kind.as_str()
            );
            self.notifier.notify(UserNotice::KindNotPermitted(kind));
            return Err(CaptureError::KindNotPermitted(kind));
        }

        let live_pending = match &self.state {
            CaptureState::Pending {
                target,
                recovered: false,
            } => Some(target.request_id),
            _ => None,
        };
        if let Some(pending) = live_pending {
            warn!(
                "event=capture_start module=capture status=rejected kind={} reason=busy pending_request_id={}",
                kind.as_str(),
                pending
            );
            self.notifier.notify(UserNotice::CaptureBusy);
            return Err(CaptureError::Busy { pending });
        }
        self.abandon_orphaned()?;

        let joins_prompt = self.permissions.is_prompting(Permission::Camera);
        match self.permissions.check_or_request(Permission::Camera) {
            PermissionDecision::Granted => {
                self.drop_superseded_deferred()?;
                self.launch(kind)
            }
            PermissionDecision::Denied => {
                self.drop_superseded_deferred()?;
                info!(
                    "event=capture_start module=capture status=rejected kind={} reason=permission_denied",
                    kind.as_str()
                );
                self.notifier.notify(UserNotice::PermissionDenied);
                Err(CaptureError::PermissionDenied)
            }
            PermissionDecision::Prompting => {
                self.defer(kind, joins_prompt)?;
                Ok(StartOutcome::AwaitingPermission)
            }
        }
    }

    /// Applies the OS answer to the camera permission prompt and resumes the
    /// deferred capture once on grant.
    ///
    /// # Errors
    /// - `Store` when the deferred action cannot be read.
    /// - Any `start_capture` error of the resumed capture.
    pub fn on_permission_result(&mut self, granted: bool) -> CaptureResult<PermissionOutcome> {
        self.permissions.resolve(Permission::Camera, granted);
        let deferred = self.store.take_deferred(Permission::Camera)?;

        if !granted {
            self.notifier.notify(UserNotice::PermissionDenied);
            return Ok(PermissionOutcome::Denied);
        }

        match deferred {
            Some(action) => match action.continuation {
                Continuation::StartCapture => {
                    info!(
                        "event=capture_resume module=capture status=start kind={}",
                        action.kind.as_str()
                    );
                    self.start_capture(action.kind)
                        .map(PermissionOutcome::Resumed)
                }
            },
            None => Ok(PermissionOutcome::NothingDeferred),
        }
    }

    /// Reconciles the capture activity result.
    ///
    /// Failure and cancellation are the same outcome. Results that do not
    /// match the pending target are logged and ignored.
    pub fn on_result(&mut self, request_id: RequestId, success: bool) -> ReconcileOutcome {
        let target = match &self.state {
            CaptureState::Pending { target, .. } if target.request_id == request_id => {
                target.clone()
            }
            CaptureState::Pending { target, .. } => {
                warn!(
                    "event=capture_result module=capture status=stale request_id={} pending_request_id={}",
                    request_id, target.request_id
                );
                return ReconcileOutcome::Stale;
            }
            CaptureState::Idle => {
                warn!(
                    "event=capture_result module=capture status=stale request_id={} pending_request_id=none",
                    request_id
                );
                return ReconcileOutcome::Stale;
            }
        };

        self.state = CaptureState::Idle;
        self.clear_durable(&target);

        if success {
            let reference =
                MediaReference::from_capture(&target, self.locations.now_epoch_ms());
            self.attachments.append(reference.clone());
            info!(
                "event=capture_result module=capture status=ok kind={} request_id={}",
                target.kind.as_str(),
                request_id
            );
            ReconcileOutcome::Attached(reference)
        } else {
            self.locations.discard(&target);
            info!(
                "event=capture_result module=capture status=failed kind={} request_id={}",
                target.kind.as_str(),
                request_id
            );
            self.notifier.notify(UserNotice::CaptureFailed(target.kind));
            ReconcileOutcome::Failed
        }
    }

    /// Treats a target recovered at startup as failed and clears it.
    ///
    /// Live targets launched by this process are left alone.
    ///
    /// # Errors
    /// - `Store` when the durable record cannot be cleared; the orphan is then
    ///   kept so it can be retried.
    pub fn abandon_orphaned(&mut self) -> CaptureResult<Option<CaptureTarget>> {
        let target = match &self.state {
            CaptureState::Pending {
                target,
                recovered: true,
            } => target.clone(),
            _ => return Ok(None),
        };

        self.store.clear_pending(target.request_id)?;
        self.state = CaptureState::Idle;
        self.locations.discard(&target);
        warn!(
            "event=capture_orphan module=capture status=abandoned kind={} request_id={}",
            target.kind.as_str(),
            target.request_id
        );
        self.notifier.notify(UserNotice::CaptureFailed(target.kind));
        Ok(Some(target))
    }

    /// Appends an existing file (gallery pick, recorded audio) directly.
    ///
    /// Does not touch permission, allocation or the pending state.
    ///
    /// # Errors
    /// - `KindNotPermitted` when the form does not offer `kind`.
    pub fn import_existing(
        &mut self,
        uri: impl Into<String>,
        kind: MediaKind,
    ) -> CaptureResult<MediaReference> {
        if !self.form.permits(kind) {
            self.notifier.notify(UserNotice::KindNotPermitted(kind));
            return Err(CaptureError::KindNotPermitted(kind));
        }
        let reference = MediaReference::new(uri, kind, self.locations.now_epoch_ms());
        self.attachments.append(reference.clone());
        info!(
            "event=attachment_import module=capture status=ok kind={}",
            kind.as_str()
        );
        Ok(reference)
    }

    /// Removes one attachment by identity. Absent ids are a no-op.
    pub fn remove_attachment(&mut self, id: AttachmentId) -> bool {
        self.attachments.remove(id)
    }

    /// Records the action a prompt resumes on grant.
    ///
    /// Presses joining a prompt already showing in this process keep the
    /// first action. A freshly started prompt replaces any action left by a
    /// prompt that was never answered.
    fn defer(&mut self, kind: MediaKind, joins_prompt: bool) -> CaptureResult<()> {
        let action = DeferredAction {
            permission: Permission::Camera,
            kind,
            continuation: Continuation::StartCapture,
            recorded_at: self.locations.now_epoch_ms(),
        };
        if !joins_prompt {
            self.store.replace_deferred(&action)?;
            info!(
                "event=capture_defer module=capture status=ok kind={}",
                kind.as_str()
            );
        } else if self.store.record_deferred(&action)? {
            info!(
                "event=capture_defer module=capture status=ok kind={}",
                kind.as_str()
            );
        } else {
            info!(
                "event=capture_defer module=capture status=coalesced kind={}",
                kind.as_str()
            );
        }
        Ok(())
    }

    /// A decision reached without a prompt answer supersedes any action still
    /// waiting on an earlier prompt.
    fn drop_superseded_deferred(&mut self) -> CaptureResult<()> {
        if self.store.clear_deferred(Permission::Camera)? {
            info!(
                "event=capture_defer module=capture status=superseded permission={}",
                Permission::Camera.as_str()
            );
        }
        Ok(())
    }

    fn launch(&mut self, kind: MediaKind) -> CaptureResult<StartOutcome> {
        let target = match self.locations.allocate(kind) {
            Ok(target) => target,
            Err(err) => {
                warn!(
                    "event=capture_start module=capture status=error kind={} error_code=allocation_failed",
                    kind.as_str()
                );
                self.notifier.notify(UserNotice::AllocationFailed);
                return Err(err.into());
            }
        };

        if let Err(err) = self.store.save_pending(&target) {
            error!(
                "event=capture_start module=capture status=error kind={} error_code=store_failed error={}",
                kind.as_str(),
                err
            );
            self.locations.discard(&target);
            self.notifier.notify(UserNotice::StorageUnavailable);
            return Err(err.into());
        }
        self.state = CaptureState::Pending {
            target: target.clone(),
            recovered: false,
        };

        if let Err(err) = self.launcher.launch(&target) {
            error!(
                "event=capture_launch module=capture status=error kind={} request_id={} error={}",
                kind.as_str(),
                target.request_id,
                err
            );
            self.state = CaptureState::Idle;
            self.clear_durable(&target);
            self.locations.discard(&target);
            self.notifier.notify(UserNotice::CaptureFailed(kind));
            return Err(CaptureError::CaptureFailed(target.request_id));
        }

        info!(
            "event=capture_launch module=capture status=ok kind={} request_id={}",
            kind.as_str(),
            target.request_id
        );
        Ok(StartOutcome::Launched(target))
    }

    fn clear_durable(&self, target: &CaptureTarget) {
        if let Err(err) = self.store.clear_pending(target.request_id) {
            error!(
                "event=capture_clear module=capture status=error request_id={} error={}",
                target.request_id, err
            );
        }
    }
}
