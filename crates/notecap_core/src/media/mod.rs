//! App-private media storage and shareable URIs.

pub mod location;
pub mod uri;
