//! Entry form configuration and draft boundary model.
//!
//! # Responsibility
//! - Parameterize the single entry screen (note vs reminder, permitted kinds).
//! - Describe the draft handed to the external persistence layer.
//!
//! # Invariants
//! - A reminder-mode draft must carry `reminder_at`; a note-mode draft must not.
//! - Title must be non-blank for a draft to be saveable.

use crate::model::media::{MediaKind, MediaReference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration of one entry screen variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFormConfig {
    /// Reminder screens require a reminder timestamp.
    pub reminder_mode: bool,
    /// Kinds the screen offers, for both capture and import.
    pub permitted_media_kinds: BTreeSet<MediaKind>,
}

impl EntryFormConfig {
    /// Note screen: camera capture plus audio and picked files.
    pub fn note() -> Self {
        Self {
            reminder_mode: false,
            permitted_media_kinds: [
                MediaKind::Photo,
                MediaKind::Video,
                MediaKind::Audio,
                MediaKind::Document,
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Reminder screen: camera capture only.
    pub fn reminder() -> Self {
        Self {
            reminder_mode: true,
            permitted_media_kinds: [MediaKind::Photo, MediaKind::Video].into_iter().collect(),
        }
    }

    pub fn permits(&self, kind: MediaKind) -> bool {
        self.permitted_media_kinds.contains(&kind)
    }
}

impl Default for EntryFormConfig {
    fn default() -> Self {
        Self::note()
    }
}

/// Draft entry as seen by the external persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds. Meaningful only in reminder mode.
    pub reminder_at: Option<i64>,
    pub attachments: Vec<MediaReference>,
}

impl EntryDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Replaces the attachment field with an attachment snapshot.
    pub fn with_attachments(mut self, attachments: Vec<MediaReference>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Whether the draft can be saved under `config`.
    pub fn is_valid(&self, config: &EntryFormConfig) -> bool {
        if self.title.trim().is_empty() {
            return false;
        }
        config.reminder_mode == self.reminder_at.is_some()
    }
}
