//! Shareable URI minting for capture targets.
//!
//! # Responsibility
//! - Turn an app-private file path into a capability URI a foreign process
//!   can write into.
//!
//! # Invariants
//! - Only paths inside the configured media root are ever minted.
//! - Minted URIs are scoped to one package-qualified authority.

use crate::config::is_valid_package_name;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};
use url::Url;

const CONTENT_SCHEME: &str = "content";
const MEDIA_PATH_SEGMENT: &str = "media";

/// Mints shareable URIs for app-private files.
pub trait ShareableUriProvider: Send {
    fn mint(&self, file_path: &Path) -> Result<String, UriMintError>;
}

/// URI minting failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriMintError {
    /// Authority is not `<package>.fileprovider`-shaped.
    MisconfiguredAuthority(String),
    /// Path lies outside the shared media root.
    OutsideMediaRoot(PathBuf),
    /// Path cannot be expressed as a URI.
    UnencodablePath(PathBuf),
}

impl Display for UriMintError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MisconfiguredAuthority(value) => {
                write!(f, "sharing authority is misconfigured: `{value}`")
            }
            Self::OutsideMediaRoot(path) => {
                write!(f, "path is outside the media root: {}", path.display())
            }
            Self::UnencodablePath(path) => {
                write!(f, "path cannot be encoded as uri: {}", path.display())
            }
        }
    }
}

impl Error for UriMintError {}

/// File-provider style URI minting: `content://<authority>/media/<relative>`.
#[derive(Debug, Clone)]
pub struct FileProviderUris {
    authority: String,
    media_root: PathBuf,
}

impl FileProviderUris {
    pub fn new(authority: impl Into<String>, media_root: impl Into<PathBuf>) -> Self {
        Self {
            authority: authority.into(),
            media_root: media_root.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }
}

impl ShareableUriProvider for FileProviderUris {
    fn mint(&self, file_path: &Path) -> Result<String, UriMintError> {
        if !is_valid_package_name(&self.authority) {
            return Err(UriMintError::MisconfiguredAuthority(self.authority.clone()));
        }

        let relative = file_path
            .strip_prefix(&self.media_root)
            .map_err(|_| UriMintError::OutsideMediaRoot(file_path.to_path_buf()))?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment
                        .to_str()
                        .ok_or_else(|| UriMintError::UnencodablePath(file_path.to_path_buf()))?;
                    segments.push(segment);
                }
                _ => return Err(UriMintError::OutsideMediaRoot(file_path.to_path_buf())),
            }
        }
        if segments.is_empty() {
            return Err(UriMintError::OutsideMediaRoot(file_path.to_path_buf()));
        }

        let mut uri = Url::parse(&format!(
            "{CONTENT_SCHEME}://{}/{MEDIA_PATH_SEGMENT}",
            self.authority
        ))
        .map_err(|_| UriMintError::MisconfiguredAuthority(self.authority.clone()))?;
        uri.path_segments_mut()
            .map_err(|_| UriMintError::MisconfiguredAuthority(self.authority.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(uri.into())
    }
}
