//! Domain model for capture orchestration and the entry boundary.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep media kinds, capture targets and attachments in one place.
//!
//! # Invariants
//! - Every in-flight capture is identified by a unique `RequestId`.
//! - Every attachment is identified by a stable `AttachmentId`.

pub mod entry;
pub mod media;
