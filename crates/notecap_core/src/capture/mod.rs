//! Camera capture orchestration.
//!
//! # Responsibility
//! - Drive permission check, target allocation, external launch and result
//!   reconciliation as one state machine.
//! - Keep OS interaction behind host traits.

pub mod coordinator;
pub mod error;
pub mod host;
