//! Ordered attachment list for the entry being edited.
//!
//! # Invariants
//! - Insertion order is display order.
//! - Duplicated URIs are allowed; identity is `MediaReference::id`.
//! - Mutation happens only from the host's UI thread, so snapshots are never
//!   taken mid-append.

use crate::model::media::{AttachmentId, MediaReference};
use log::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentList {
    items: Vec<MediaReference>,
}

impl AttachmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the list from an entry being re-opened for editing.
    pub fn from_existing(items: Vec<MediaReference>) -> Self {
        Self { items }
    }

    /// Appends at the tail.
    pub fn append(&mut self, reference: MediaReference) {
        debug!(
            "event=attachment_append module=attachments status=ok kind={} position={}",
            reference.kind.as_str(),
            self.items.len()
        );
        self.items.push(reference);
    }

    /// Removes the reference with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: AttachmentId) -> bool {
        let Some(position) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };
        self.items.remove(position);
        debug!(
            "event=attachment_remove module=attachments status=ok position={}",
            position
        );
        true
    }

    /// Owned, ordered copy for rendering and persistence.
    pub fn snapshot(&self) -> Vec<MediaReference> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
