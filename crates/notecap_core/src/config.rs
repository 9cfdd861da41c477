//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where media and durable capture state live.
//! - Carry the entry screen variant the host is showing.
//!
//! # Invariants
//! - `media_root` and `db_path` are absolute.
//! - `package_name` is a dotted identifier; it qualifies the URI authority.

use crate::model::entry::EntryFormConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const FILE_PROVIDER_SUFFIX: &str = "fileprovider";

/// Configuration handed over by the host on startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// App-private directory that receives captured media.
    pub media_root: PathBuf,
    /// Host application package, e.g. `com.example.inventory`.
    pub package_name: String,
    /// SQLite file holding pending captures and deferred actions.
    pub db_path: PathBuf,
    #[serde(default)]
    pub form: EntryFormConfig,
}

impl CoreConfig {
    /// Validates paths and package naming.
    ///
    /// # Errors
    /// - `RelativePath` when `media_root` or `db_path` is empty or relative.
    /// - `InvalidPackageName` when `package_name` is not a dotted identifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, path) in [("media_root", &self.media_root), ("db_path", &self.db_path)] {
            if path.as_os_str().is_empty() || !path.is_absolute() {
                return Err(ConfigError::RelativePath {
                    field,
                    value: path.display().to_string(),
                });
            }
        }
        if !is_valid_package_name(&self.package_name) {
            return Err(ConfigError::InvalidPackageName(self.package_name.clone()));
        }
        Ok(())
    }

    /// Shareable URI authority derived from the package name.
    pub fn file_provider_authority(&self) -> String {
        format!("{}.{FILE_PROVIDER_SUFFIX}", self.package_name)
    }
}

/// Returns whether `value` looks like `segment(.segment)+`.
pub(crate) fn is_valid_package_name(value: &str) -> bool {
    let mut segments = 0;
    for segment in value.split('.') {
        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_ascii_alphabetic() {
            return false;
        }
        if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    RelativePath { field: &'static str, value: String },
    InvalidPackageName(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelativePath { field, value } => {
                write!(f, "{field} must be an absolute path, got `{value}`")
            }
            Self::InvalidPackageName(value) => write!(f, "invalid package name: `{value}`"),
        }
    }
}

impl Error for ConfigError {}
