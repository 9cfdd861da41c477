//! Capture error taxonomy.
//!
//! Every variant is recovered at the coordinator boundary: the entry form
//! stays usable whatever the outcome. Stale results are not errors; they are
//! reported as `ReconcileOutcome::Stale` and logged only.

use crate::db::DbError;
use crate::media::location::AllocationError;
use crate::model::media::{MediaKind, RequestId};
use crate::repo::capture_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CaptureResult<T> = Result<T, CaptureError>;

#[derive(Debug)]
pub enum CaptureError {
    /// Permission was denied; nothing was allocated.
    PermissionDenied,
    /// No write location; nothing was launched.
    Allocation(AllocationError),
    /// The capture activity could not be started; target discarded.
    CaptureFailed(RequestId),
    /// Another capture is in flight; it is left untouched.
    Busy { pending: RequestId },
    /// The entry form does not offer this kind for the requested flow.
    KindNotPermitted(MediaKind),
    /// Durable capture state could not be read or written.
    Store(RepoError),
}

impl Display for CaptureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "camera permission denied"),
            Self::Allocation(err) => write!(f, "capture allocation failed: {err}"),
            Self::CaptureFailed(id) => write!(f, "capture {id} failed to launch"),
            Self::Busy { pending } => write!(f, "capture {pending} is still pending"),
            Self::KindNotPermitted(kind) => {
                write!(f, "media kind `{}` is not permitted here", kind.as_str())
            }
            Self::Store(err) => write!(f, "capture state store failed: {err}"),
        }
    }
}

impl Error for CaptureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Allocation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocationError> for CaptureError {
    fn from(value: AllocationError) -> Self {
        Self::Allocation(value)
    }
}

impl From<RepoError> for CaptureError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<DbError> for CaptureError {
    fn from(value: DbError) -> Self {
        Self::Store(RepoError::Db(value))
    }
}
