//! Capture target allocation.
//!
//! # Responsibility
//! - Allocate one collision-free file per capture under app-private storage.
//! - Mint the shareable URI the external capture activity writes into.
//!
//! # Invariants
//! - File names derive from kind and allocation timestamp; allocations in the
//!   same millisecond get a monotonically increasing counter suffix.
//! - Files are created with create-new semantics; an existing file is never
//!   reused or truncated.
//! - A failed allocation leaves no file behind.

use crate::clock::Clock;
use crate::media::uri::{ShareableUriProvider, UriMintError};
use crate::model::media::{CaptureTarget, MediaKind};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const MAX_NAME_ATTEMPTS: u32 = 64;

/// Allocation failures. The caller must not launch on any of these.
#[derive(Debug)]
pub enum AllocationError {
    /// Kind is not produced by the camera activity.
    UnsupportedKind(MediaKind),
    /// Media directory could not be created.
    Directory { path: PathBuf, source: std::io::Error },
    /// Target file could not be created.
    File { path: PathBuf, source: std::io::Error },
    /// Every candidate name in this millisecond already exists.
    NamesExhausted(PathBuf),
    /// Shareable URI could not be minted.
    Uri(UriMintError),
}

impl Display for AllocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedKind(kind) => {
                write!(f, "kind `{}` cannot be captured", kind.as_str())
            }
            Self::Directory { path, source } => write!(
                f,
                "failed to create media directory `{}`: {source}",
                path.display()
            ),
            Self::File { path, source } => write!(
                f,
                "failed to create capture file `{}`: {source}",
                path.display()
            ),
            Self::NamesExhausted(dir) => {
                write!(f, "no free capture file name in `{}`", dir.display())
            }
            Self::Uri(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AllocationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory { source, .. } | Self::File { source, .. } => Some(source),
            Self::Uri(err) => Some(err),
            Self::UnsupportedKind(_) | Self::NamesExhausted(_) => None,
        }
    }
}

impl From<UriMintError> for AllocationError {
    fn from(value: UriMintError) -> Self {
        Self::Uri(value)
    }
}

/// Allocates capture targets under one media root.
pub struct MediaLocationFactory {
    media_root: PathBuf,
    uris: Box<dyn ShareableUriProvider>,
    clock: Box<dyn Clock>,
    last_stamp: i64,
    sequence: u32,
}

impl MediaLocationFactory {
    pub fn new(
        media_root: impl Into<PathBuf>,
        uris: Box<dyn ShareableUriProvider>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            media_root: media_root.into(),
            uris,
            clock,
            last_stamp: i64::MIN,
            sequence: 0,
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn now_epoch_ms(&self) -> i64 {
        self.clock.now_epoch_ms()
    }

    /// Allocates a fresh target for `kind`.
    ///
    /// # Errors
    /// - `UnsupportedKind` for import-only kinds.
    /// - `Directory`/`File` when storage is not writable.
    /// - `Uri` when the sharing authority rejects the path.
    pub fn allocate(&mut self, kind: MediaKind) -> Result<CaptureTarget, AllocationError> {
        if !kind.is_camera_capture() {
            return Err(AllocationError::UnsupportedKind(kind));
        }

        let dir = self.media_root.join(kind.directory_name());
        if let Err(source) = std::fs::create_dir_all(&dir) {
            error!(
                "event=media_allocate module=media status=error kind={} error_code=dir_create_failed error={}",
                kind.as_str(),
                source
            );
            return Err(AllocationError::Directory { path: dir, source });
        }

        let allocated_at = self.clock.now_epoch_ms();
        let file_path = self.create_unique_file(&dir, kind, allocated_at)?;

        let uri = match self.uris.mint(&file_path) {
            Ok(uri) => uri,
            Err(err) => {
                let _ = std::fs::remove_file(&file_path);
                error!(
                    "event=media_allocate module=media status=error kind={} error_code=uri_mint_failed error={}",
                    kind.as_str(),
                    err
                );
                return Err(err.into());
            }
        };

        let target = CaptureTarget {
            request_id: Uuid::new_v4(),
            kind,
            uri,
            file_path,
            allocated_at,
        };
        info!(
            "event=media_allocate module=media status=ok kind={} request_id={} sequence={}",
            kind.as_str(),
            target.request_id,
            self.sequence
        );
        Ok(target)
    }

    fn create_unique_file(
        &mut self,
        dir: &Path,
        kind: MediaKind,
        stamp: i64,
    ) -> Result<PathBuf, AllocationError> {
        if stamp == self.last_stamp {
            self.sequence += 1;
        } else {
            self.last_stamp = stamp;
            self.sequence = 0;
        }

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(file_name(kind, stamp, self.sequence));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(path),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(
                        "event=media_allocate module=media status=collision kind={} sequence={}",
                        kind.as_str(),
                        self.sequence
                    );
                    self.sequence += 1;
                }
                Err(source) => return Err(AllocationError::File { path, source }),
            }
        }
        Err(AllocationError::NamesExhausted(dir.to_path_buf()))
    }

    /// Removes the file behind a discarded target. Missing files are fine.
    pub fn discard(&self, target: &CaptureTarget) {
        match std::fs::remove_file(&target.file_path) {
            Ok(()) => debug!(
                "event=media_discard module=media status=ok request_id={}",
                target.request_id
            ),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => error!(
                "event=media_discard module=media status=error request_id={} error={}",
                target.request_id, err
            ),
        }
    }
}

fn file_name(kind: MediaKind, stamp: i64, sequence: u32) -> String {
    let prefix = match kind {
        MediaKind::Photo => "photo",
        MediaKind::Video => "video",
        MediaKind::Audio => "audio",
        MediaKind::Document => "document",
    };
    if sequence == 0 {
        format!("{prefix}_{stamp}.{}", kind.file_extension())
    } else {
        format!("{prefix}_{stamp}_{sequence}.{}", kind.file_extension())
    }
}

#[cfg(test)]
mod tests {
    use super::file_name;
    use crate::model::media::MediaKind;

    #[test]
    fn first_name_in_a_millisecond_has_no_suffix() {
        assert_eq!(file_name(MediaKind::Video, 42, 0), "video_42.mp4");
        assert_eq!(file_name(MediaKind::Photo, 42, 3), "photo_42_3.jpg");
    }
}
