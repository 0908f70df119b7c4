//! Cached authorization state

use crate::snapshot::AuthorizationSnapshot;
use serde::Serialize;
use std::collections::BTreeSet;

/// The session's authorization state as seen by consumers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorizationState {
    /// Granted permission identifiers, deduplicated
    pub permissions: BTreeSet<String>,

    /// Role of the session, absent when unauthenticated or unknown
    pub role: Option<String>,

    /// True while at least one fetch is in flight
    pub loading: bool,
}

impl AuthorizationState {
    /// Whether the given permission is granted
    pub fn has(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether any of the given permissions is granted
    pub fn has_any<'a>(&self, permissions: impl IntoIterator<Item = &'a str>) -> bool {
        permissions.into_iter().any(|p| self.has(p))
    }

    /// A session with neither a role nor permissions is treated as
    /// unauthenticated
    pub fn is_authenticated(&self) -> bool {
        self.role.is_some() || !self.permissions.is_empty()
    }

    /// Replace permissions and role with a fetched snapshot
    pub(crate) fn apply(&mut self, snapshot: AuthorizationSnapshot) {
        self.permissions = snapshot.permissions.into_iter().collect();
        self.role = snapshot.role;
    }

    /// Drop everything back to the unauthenticated state
    pub(crate) fn revoke(&mut self) {
        self.permissions.clear();
        self.role = None;
    }
}
