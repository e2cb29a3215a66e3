//! Admin gate and explicit session values
//!
//! The storefront has a single shared admin secret. Checking it yields a
//! [`Session`] that the presentation layer threads through its own call tree;
//! there is no process-wide "is admin" flag.
//!
//! The gate is a plain string comparison against one configured value.

use std::fmt;

/// Who is driving the current interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    /// Public browsing
    #[default]
    Visitor,

    /// Passed the admin gate
    Admin,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        matches!(self, Session::Admin)
    }

    /// Drop admin rights (logout)
    pub fn end(&mut self) {
        *self = Session::Visitor;
    }
}

/// Access required by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Browsing: listing and reading items
    Public,

    /// Inventory management: create, update, delete
    AdminOnly,
}

impl AccessPolicy {
    /// Check if a session satisfies this policy
    pub fn check(&self, session: &Session) -> bool {
        match self {
            AccessPolicy::Public => true,
            AccessPolicy::AdminOnly => session.is_admin(),
        }
    }
}

/// Shared-secret admin check
#[derive(Clone)]
pub struct AdminGate {
    secret: String,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Compare a candidate secret against the configured one
    pub fn is_admin(&self, candidate: &str) -> bool {
        !self.secret.is_empty() && candidate == self.secret
    }

    /// Start a session for whoever presented `candidate`
    pub fn login(&self, candidate: &str) -> Session {
        if self.is_admin(candidate) {
            tracing::info!("Admin session started");
            Session::Admin
        } else {
            tracing::warn!("Rejected admin login attempt");
            Session::Visitor
        }
    }
}

// Keep the secret out of debug output
impl fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminGate").field("secret", &"***").finish()
    }
}
