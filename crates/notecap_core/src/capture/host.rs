//! Host-side boundaries of the capture flow.
//!
//! The core never talks to the OS directly: the camera activity and
//! user-visible notices go through these traits, implemented by the host
//! shell (FFI effect queue in production, recording fakes in tests).

use crate::model::media::{CaptureTarget, MediaKind};
use crate::permission::PermissionApi;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Synchronous launch failure reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    /// No activity can handle the capture intent.
    NoCaptureActivity,
    /// Host rejected the launch for another reason.
    Rejected(String),
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCaptureActivity => write!(f, "no capture activity available"),
            Self::Rejected(reason) => write!(f, "capture launch rejected: {reason}"),
        }
    }
}

impl Error for LaunchError {}

/// Starts the out-of-process capture activity.
///
/// The result arrives later through `CaptureCoordinator::on_result`, at most
/// once, and never if the process dies first.
pub trait CaptureLauncher: Send {
    fn launch(&mut self, target: &CaptureTarget) -> Result<(), LaunchError>;
}

/// User-visible, non-fatal notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserNotice {
    PermissionDenied,
    AllocationFailed,
    CaptureFailed(MediaKind),
    CaptureBusy,
    KindNotPermitted(MediaKind),
    StorageUnavailable,
}

impl UserNotice {
    /// Stable code for host-side localization.
    pub fn code(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::AllocationFailed => "allocation_failed",
            Self::CaptureFailed(_) => "capture_failed",
            Self::CaptureBusy => "capture_busy",
            Self::KindNotPermitted(_) => "kind_not_permitted",
            Self::StorageUnavailable => "storage_unavailable",
        }
    }

    /// Default English message.
    pub fn message(self) -> String {
        match self {
            Self::PermissionDenied => "Camera permission denied".to_string(),
            Self::AllocationFailed => "Could not create a file for the capture".to_string(),
            Self::CaptureFailed(MediaKind::Video) => "Video recording failed".to_string(),
            Self::CaptureFailed(_) => "Photo capture failed".to_string(),
            Self::CaptureBusy => "A capture is already in progress".to_string(),
            Self::KindNotPermitted(kind) => {
                format!("{} attachments are not available here", kind.as_str())
            }
            Self::StorageUnavailable => "Capture state could not be saved".to_string(),
        }
    }
}

/// Surfaces notices to the user (toast, snackbar).
pub trait UserNotifier: Send {
    fn notify(&mut self, notice: UserNotice);
}

/// Host implementations wired into one coordinator.
pub struct HostBindings {
    pub permissions: Box<dyn PermissionApi>,
    pub launcher: Box<dyn CaptureLauncher>,
    pub notifier: Box<dyn UserNotifier>,
}
