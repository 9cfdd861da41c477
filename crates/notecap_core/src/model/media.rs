//! Media domain model.
//!
//! # Responsibility
//! - Define media kinds, in-flight capture targets and confirmed references.
//! - Provide the stable string ids used by storage and the FFI boundary.
//!
//! # Invariants
//! - Only `Photo` and `Video` can be produced by the camera capture flow.
//! - `CaptureTarget.request_id` is unique per allocation and never reused.
//! - `MediaReference` is immutable once created.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Unique token correlating one capture launch with its async result.
pub type RequestId = Uuid;

/// Stable identity of one attachment inside an entry.
pub type AttachmentId = Uuid;

/// Category of media linked to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Still image written by the external camera activity.
    Photo,
    /// Video clip written by the external camera activity.
    Video,
    /// Recorded audio. Import path only.
    Audio,
    /// Any picked file. Import path only.
    Document,
}

impl MediaKind {
    /// Stable string id used in storage rows and FFI payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }

    /// Parses a stable string id. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "document" => Some(Self::Document),
            _ => None,
        }
    }

    /// Whether the external camera activity can produce this kind.
    pub fn is_camera_capture(self) -> bool {
        matches!(self, Self::Photo | Self::Video)
    }

    /// Sub-directory of the media root holding files of this kind.
    pub fn directory_name(self) -> &'static str {
        match self {
            Self::Photo => "photos",
            Self::Video => "videos",
            Self::Audio => "audio",
            Self::Document => "documents",
        }
    }

    /// File extension used for allocated capture files.
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Photo => "jpg",
            Self::Video => "mp4",
            Self::Audio => "m4a",
            Self::Document => "bin",
        }
    }
}

/// Write location handed to the external capture activity.
///
/// Lives only while one capture is in flight. The durable copy in
/// `pending_captures` lets a late result be attributed after restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTarget {
    /// Correlation token for the async result.
    pub request_id: RequestId,
    pub kind: MediaKind,
    /// Shareable URI the foreign process writes into.
    pub uri: String,
    /// Backing file inside app-private storage.
    pub file_path: PathBuf,
    /// Unix epoch milliseconds.
    pub allocated_at: i64,
}

/// Confirmed media attached to the current entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Identity used by remove; two references to the same URI stay distinct.
    pub id: AttachmentId,
    pub uri: String,
    pub kind: MediaKind,
    /// Unix epoch milliseconds.
    pub captured_at: i64,
}

impl MediaReference {
    /// Creates a reference with a freshly generated identity.
    pub fn new(uri: impl Into<String>, kind: MediaKind, captured_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            uri: uri.into(),
            kind,
            captured_at,
        }
    }

    /// Builds the reference confirmed by a successful capture of `target`.
    pub fn from_capture(target: &CaptureTarget, captured_at: i64) -> Self {
        Self::new(target.uri.clone(), target.kind, captured_at)
    }
}
