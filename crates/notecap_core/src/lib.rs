//! Core capture logic for the notecap entry screen.
//! This crate is the single source of truth for capture invariants.

pub mod attachments;
pub mod capture;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod media;
pub mod model;
pub mod permission;
pub mod repo;

pub use attachments::AttachmentList;
pub use capture::coordinator::{
    CaptureCoordinator, CaptureState, PermissionOutcome, ReconcileOutcome, StartOutcome,
};
pub use capture::error::{CaptureError, CaptureResult};
pub use capture::host::{CaptureLauncher, HostBindings, LaunchError, UserNotice, UserNotifier};
pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use media::location::{AllocationError, MediaLocationFactory};
pub use media::uri::{FileProviderUris, ShareableUriProvider, UriMintError};
pub use model::entry::{EntryDraft, EntryFormConfig};
pub use model::media::{AttachmentId, CaptureTarget, MediaKind, MediaReference, RequestId};
pub use permission::{
    Continuation, DeferredAction, Permission, PermissionApi, PermissionDecision, PermissionGate,
    PermissionState,
};
pub use repo::capture_repo::{
    CaptureStateRepository, RepoError, RepoResult, SqliteCaptureStateRepository,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
