//! Role-based authorization.
//!
//! The identity layer is an external collaborator: it authenticates actors
//! and hands the engine an [`ActorId`] per call. The engine still has to
//! enforce which identities may perform gated operations, so it keeps an
//! explicit grant table and checks it at the top of every gated entry
//! point via [`RoleGrants::authorize`].

use crate::error::AuthError;
use crate::types::ActorId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Capability roles recognized by the engine.
///
/// Plain buyers need no role: `purchase` and `refund` are open operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May create events, issue tickets directly, and open sales
    Organizer,
    /// May consume tickets at check-in
    Verifier,
    /// May end sales, withdraw proceeds, and manage grants
    Administrator,
}

/// In-memory grant table mapping actors to the roles they hold.
#[derive(Clone, Debug, Default)]
pub struct RoleGrants {
    grants: HashMap<ActorId, HashSet<Role>>,
}

impl RoleGrants {
    /// Create an empty grant table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a grant table seeded with a root administrator
    #[must_use]
    pub fn with_administrator(root: ActorId) -> Self {
        let mut grants = Self::new();
        grants.grant(root, Role::Administrator);
        grants
    }

    /// Grant `role` to `actor`
    pub fn grant(&mut self, actor: ActorId, role: Role) {
        self.grants.entry(actor).or_default().insert(role);
    }

    /// Revoke `role` from `actor`; a no-op if the grant is absent
    pub fn revoke(&mut self, actor: ActorId, role: Role) {
        if let Some(roles) = self.grants.get_mut(&actor) {
            roles.remove(&role);
            if roles.is_empty() {
                self.grants.remove(&actor);
            }
        }
    }

    /// Whether `actor` holds `role`
    #[must_use]
    pub fn has(&self, actor: ActorId, role: Role) -> bool {
        self.grants.get(&actor).is_some_and(|roles| roles.contains(&role))
    }

    /// Require that `actor` holds `role`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] if the grant is absent.
    pub fn authorize(&self, actor: ActorId, role: Role) -> Result<(), AuthError> {
        if self.has(actor, role) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized { actor, role })
        }
    }
}
