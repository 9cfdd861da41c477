//! Runtime permission gate.
//!
//! # Responsibility
//! - Cache permission outcomes for the process lifetime.
//! - Trigger the OS permission dialog at most once per unresolved request.
//! - Describe the deferred action resumed by a grant event.
//!
//! # Invariants
//! - While a prompt is in flight for a permission, no second prompt is issued.
//! - A cached `Granted` is never downgraded by a later self-check.
//! - Cached state is volatile; deferred actions are the durable part.

use crate::model::media::MediaKind;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Runtime permission guarded by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Camera,
}

impl Permission {
    /// Stable storage id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Camera => "camera",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "camera" => Some(Self::Camera),
            _ => None,
        }
    }

    /// Platform permission identifier handed to the OS API.
    pub fn platform_id(self) -> &'static str {
        match self {
            Self::Camera => "android.permission.CAMERA",
        }
    }
}

/// Process-lifetime permission cache value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

/// Outcome of `PermissionGate::check_or_request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied,
    /// The OS dialog is showing; the answer arrives via `resolve`.
    Prompting,
}

/// OS permission API.
pub trait PermissionApi: Send {
    /// Synchronous self-check of the current grant.
    fn is_granted(&self, permission: Permission) -> bool;
    /// Shows the OS dialog. The answer is delivered later, exactly once.
    fn request(&mut self, permission: Permission);
}

/// Action to resume once a permission is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continuation {
    StartCapture,
}

impl Continuation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartCapture => "start_capture",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "start_capture" => Some(Self::StartCapture),
            _ => None,
        }
    }
}

/// Pending-action record resolved by the grant event.
///
/// Stored as data rather than a closure so it survives a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredAction {
    pub permission: Permission,
    pub kind: MediaKind,
    pub continuation: Continuation,
    /// Unix epoch milliseconds.
    pub recorded_at: i64,
}

/// Permission cache with prompt coalescing.
pub struct PermissionGate {
    api: Box<dyn PermissionApi>,
    states: BTreeMap<Permission, PermissionState>,
    in_flight: BTreeSet<Permission>,
}

impl PermissionGate {
    pub fn new(api: Box<dyn PermissionApi>) -> Self {
        Self {
            api,
            states: BTreeMap::new(),
            in_flight: BTreeSet::new(),
        }
    }

    /// Cached state for `permission`.
    pub fn state(&self, permission: Permission) -> PermissionState {
        self.states.get(&permission).copied().unwrap_or_default()
    }

    /// Whether a dialog for `permission` is currently showing.
    pub fn is_prompting(&self, permission: Permission) -> bool {
        self.in_flight.contains(&permission)
    }

    /// Returns the resolved state or starts (or joins) the OS prompt.
    ///
    /// Evaluation order: cached grant, OS self-check, cached denial, prompt.
    pub fn check_or_request(&mut self, permission: Permission) -> PermissionDecision {
        if self.state(permission) == PermissionState::Granted {
            return PermissionDecision::Granted;
        }
        if self.api.is_granted(permission) {
            self.states.insert(permission, PermissionState::Granted);
            self.in_flight.remove(&permission);
            return PermissionDecision::Granted;
        }
        if self.state(permission) == PermissionState::Denied {
            debug!(
                "event=permission_check module=permission status=denied permission={} cached=true",
                permission.as_str()
            );
            return PermissionDecision::Denied;
        }
        if self.in_flight.insert(permission) {
            info!(
                "event=permission_request module=permission status=start permission={}",
                permission.as_str()
            );
            self.api.request(permission);
        } else {
            debug!(
                "event=permission_request module=permission status=coalesced permission={}",
                permission.as_str()
            );
        }
        PermissionDecision::Prompting
    }

    /// Records the OS answer for `permission`.
    ///
    /// Answers arriving without a prompt in flight (redelivered after a
    /// restart) are still cached.
    pub fn resolve(&mut self, permission: Permission, granted: bool) -> PermissionState {
        if !self.in_flight.remove(&permission) {
            warn!(
                "event=permission_result module=permission status=unsolicited permission={}",
                permission.as_str()
            );
        }
        let state = if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        };
        self.states.insert(permission, state);
        info!(
            "event=permission_result module=permission status=ok permission={} granted={}",
            permission.as_str(),
            granted
        );
        state
    }
}
