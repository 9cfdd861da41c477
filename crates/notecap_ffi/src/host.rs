//! Effect-queue host bindings.
//!
//! # Responsibility
//! - Implement the core host traits by recording effects for the UI shell.
//! - Let the shell perform OS calls (dialog, camera intent, toast) after each
//!   FFI call returns.
//!
//! # Invariants
//! - Effects are drained in the order the core produced them.
//! - The permission self-check reflects the value the shell passed with the
//!   current call.

use notecap_core::{
    CaptureLauncher, CaptureTarget, HostBindings, LaunchError, Permission, PermissionApi,
    UserNotice, UserNotifier,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Side effect the UI shell must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEffect {
    /// Show the OS permission dialog; answer via `capture_on_permission_result`.
    RequestPermission { permission: String },
    /// Start the camera activity writing into `uri`; answer via
    /// `capture_on_result` with the same `request_id`.
    LaunchCapture {
        request_id: String,
        uri: String,
        kind: String,
    },
    /// Show a transient user-visible notice.
    ShowNotice { code: String, message: String },
}

#[derive(Clone, Default)]
pub(crate) struct EffectQueue {
    effects: Arc<Mutex<Vec<HostEffect>>>,
    camera_granted: Arc<AtomicBool>,
}

impl EffectQueue {
    pub(crate) fn set_camera_granted(&self, granted: bool) {
        self.camera_granted.store(granted, Ordering::SeqCst);
    }

    pub(crate) fn drain(&self) -> Vec<HostEffect> {
        let mut effects = self
            .effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *effects)
    }

    pub(crate) fn bindings(&self) -> HostBindings {
        HostBindings {
            permissions: Box::new(QueuedPermissions(self.clone())),
            launcher: Box::new(QueuedLauncher(self.clone())),
            notifier: Box::new(QueuedNotifier(self.clone())),
        }
    }

    fn push(&self, effect: HostEffect) {
        self.effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(effect);
    }
}

struct QueuedPermissions(EffectQueue);

impl PermissionApi for QueuedPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::Camera => self.0.camera_granted.load(Ordering::SeqCst),
        }
    }

    fn request(&mut self, permission: Permission) {
        self.0.push(HostEffect::RequestPermission {
            permission: permission.platform_id().to_string(),
        });
    }
}

struct QueuedLauncher(EffectQueue);

impl CaptureLauncher for QueuedLauncher {
    fn launch(&mut self, target: &CaptureTarget) -> Result<(), LaunchError> {
        self.0.push(HostEffect::LaunchCapture {
            request_id: target.request_id.to_string(),
            uri: target.uri.clone(),
            kind: target.kind.as_str().to_string(),
        });
        Ok(())
    }
}

struct QueuedNotifier(EffectQueue);

impl UserNotifier for QueuedNotifier {
    fn notify(&mut self, notice: UserNotice) {
        self.0.push(HostEffect::ShowNotice {
            code: notice.code().to_string(),
            message: notice.message(),
        });
    }
}
