//! Repository layer for durable capture state.
//!
//! # Responsibility
//! - Define the persistence contract the coordinator depends on.
//! - Isolate SQLite query details from capture orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`SlotOccupied`) in addition to
//!   DB transport errors.

pub mod capture_repo;
